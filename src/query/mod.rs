//! Query engine over the reference index.
//!
//! Two query shapes are supported:
//! - **Element queries** start from a resolved [`ProgramElement`]. Types are
//!   looked up by qualified name. Fields and callables are looked up by
//!   member key (name only), then narrowed by resolving each candidate
//!   against the live program model and keeping exact matches.
//! - **Pattern queries** match a wildcard pattern against element keys.

use crate::error::Result;
use crate::index::{keys, RecordSet, ReferenceIndex};
use crate::model::{ElementKind, ProgramElement, ProgramModel};
use std::sync::Arc;

/// A query against the reference index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// References to one concrete element.
    Element {
        /// The queried element.
        element: ProgramElement,
        /// Narrow name-based candidates by resolving them.
        resolve: bool,
    },
    /// References whose element key matches a wildcard pattern.
    Pattern {
        /// Pattern text (`*` and `?` wildcards).
        pattern: String,
        /// Kind of element the pattern names.
        kind: ElementKind,
        /// Whether matching is case-sensitive.
        case_sensitive: bool,
    },
}

impl Query {
    /// Element kind this query looks for.
    pub fn kind(&self) -> ElementKind {
        match self {
            Query::Element { element, .. } => element.kind,
            Query::Pattern { kind, .. } => *kind,
        }
    }
}

/// Answers [`Query`]s using an index and a program model.
#[derive(Clone)]
pub struct QueryEngine {
    index: Arc<ReferenceIndex>,
    model: Arc<dyn ProgramModel>,
}

impl std::fmt::Debug for QueryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryEngine")
            .field("index", &self.index.stats())
            .finish_non_exhaustive()
    }
}

impl QueryEngine {
    /// Engine over `index`, resolving candidates with `model`.
    pub fn new(index: Arc<ReferenceIndex>, model: Arc<dyn ProgramModel>) -> Self {
        Self { index, model }
    }

    /// The index being queried.
    pub fn index(&self) -> &Arc<ReferenceIndex> {
        &self.index
    }

    /// Run any query.
    ///
    /// # Errors
    /// Returns `InvalidPattern` for uncompilable pattern queries.
    pub fn run(&self, query: &Query) -> Result<RecordSet> {
        match query {
            Query::Element { element, resolve } => Ok(self.find_element(element, *resolve)),
            Query::Pattern {
                pattern,
                kind,
                case_sensitive,
            } => self.index.find_pattern(pattern, *kind, *case_sensitive),
        }
    }

    /// References to `element`.
    ///
    /// With `resolve`, member candidates that do not resolve to exactly
    /// `element` are dropped, including ones that no longer resolve at all.
    pub fn find_element(&self, element: &ProgramElement, resolve: bool) -> RecordSet {
        if element.kind == ElementKind::Type {
            return self.index.find_exact(&element.declaring_type);
        }

        let key = keys::member_key(&element.name, element.kind.is_callable());
        let candidates = self.index.find_exact(&key);
        if !resolve {
            return candidates;
        }

        let total = candidates.len();
        let kept: RecordSet = candidates
            .into_iter()
            .filter(|record| match self.model.resolve(record) {
                Some(resolved) => resolved == *element,
                None => {
                    log::debug!(
                        "Dropping unresolvable reference {} in {}",
                        record.to_reference_text(),
                        record.source_file()
                    );
                    false
                }
            })
            .collect();
        log::debug!(
            "Resolved {} of {} candidates for {}",
            kept.len(),
            total,
            element.qualified_name()
        );
        kept
    }

    /// References whose element key matches `pattern`.
    ///
    /// # Errors
    /// Returns `InvalidPattern` if the pattern cannot be compiled.
    pub fn find_pattern(
        &self,
        pattern: &str,
        kind: ElementKind,
        case_sensitive: bool,
    ) -> Result<RecordSet> {
        self.index.find_pattern(pattern, kind, case_sensitive)
    }
}
