//! Wildcard patterns over element keys.
//!
//! `*` matches any run of characters (including none) and `?` exactly one.
//! Every other character is literal. Matching is delegated to
//! [`glob::Pattern`] after escaping glob's extra metacharacters.

use crate::error::{Result, ScriptRefError};
use glob::{MatchOptions, Pattern};

/// Whether `text` contains wildcard characters.
pub fn has_wildcards(text: &str) -> bool {
    text.contains(['*', '?'])
}

/// A compiled wildcard pattern.
#[derive(Debug, Clone)]
pub struct WildcardPattern {
    pattern: Pattern,
    case_sensitive: bool,
}

impl WildcardPattern {
    /// Compile `text`. Case-insensitive patterns lower-case both sides.
    ///
    /// # Errors
    /// Returns `InvalidPattern` if the escaped pattern is rejected by glob.
    pub fn new(text: &str, case_sensitive: bool) -> Result<Self> {
        let text = if case_sensitive {
            text.to_string()
        } else {
            text.to_lowercase()
        };

        let mut escaped = String::with_capacity(text.len());
        let mut previous_star = false;
        for c in text.chars() {
            match c {
                // glob rejects `**` outside a whole path component
                '*' if previous_star => continue,
                '*' | '?' => escaped.push(c),
                _ => escaped.push_str(&Pattern::escape(&c.to_string())),
            }
            previous_star = c == '*';
        }

        let pattern = Pattern::new(&escaped).map_err(|e| ScriptRefError::InvalidPattern {
            pattern: text.clone(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            pattern,
            case_sensitive,
        })
    }

    /// Match a candidate key.
    pub fn matches(&self, candidate: &str) -> bool {
        let options = MatchOptions {
            case_sensitive: true,
            require_literal_separator: false,
            require_literal_leading_dot: false,
        };
        if self.case_sensitive {
            self.pattern.matches_with(candidate, options)
        } else {
            self.pattern.matches_with(&candidate.to_lowercase(), options)
        }
    }
}
