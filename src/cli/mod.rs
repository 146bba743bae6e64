//! Command-line interface for scriptref.
//!
//! This module handles argument parsing and user interface only.
//! Index operations are performed by the library modules.

use crate::error::{Result, ScriptRefError};
use crate::model::{ElementKind, ProgramElement};
use crate::reference::{normalize_class_name, MEMBER_SEPARATOR, REFERENCE_MARKER};
use crate::search::SearchMatch;
use crate::workspace::IndexConfig;
use clap::Parser;
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;

/// Scriptref: cross-language symbol reference index.
#[derive(Parser, Debug)]
#[command(name = "scriptref")]
#[command(author, version, about, long_about = None)]
#[command(subcommand_required = true)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory.
    #[arg(long, global = true, default_value = ".")]
    pub root: PathBuf,

    /// Index document (defaults to <root>/.scriptref/index.json).
    #[arg(long, global = true, value_name = "FILE")]
    pub index: Option<PathBuf>,

    /// Emit JSON payloads instead of text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl Cli {
    /// Index configuration described by the global flags.
    pub fn config(&self) -> IndexConfig {
        let config = IndexConfig::for_root(&self.root);
        match &self.index {
            Some(path) => config.with_index_path(path),
            None => config,
        }
    }
}

/// Available scriptref commands.
#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Replace the indexed references of one file.
    Index {
        /// Workspace-relative source file.
        #[arg(short, long)]
        file: String,

        /// JSON array of reference entries found in the file.
        #[arg(short, long, value_name = "FILE")]
        records: PathBuf,
    },

    /// Find references to one type or member.
    Refs {
        /// Qualified type name (e.g. `com.acme.Outer$Inner`).
        #[arg(long = "type", value_name = "TYPE", conflicts_with = "member")]
        type_name: Option<String>,

        /// Member as `Class::name` or `Class::name(signature)`.
        #[arg(long, value_name = "MEMBER", required_unless_present = "type_name")]
        member: Option<String>,
    },

    /// Find references matching a wildcard pattern.
    Search {
        /// Pattern with `*` and `?` wildcards.
        #[arg(short, long)]
        pattern: String,

        /// Kind of element the pattern names.
        #[arg(short, long, value_enum, default_value = "type")]
        kind: KindArg,

        /// Match case-insensitively.
        #[arg(short = 'i', long)]
        ignore_case: bool,
    },

    /// Remove indexed references.
    Clear {
        /// Remove one file.
        #[arg(long, conflicts_with_all = ["container", "all"])]
        file: Option<String>,

        /// Remove every file under a container path.
        #[arg(long, conflicts_with = "all")]
        container: Option<String>,

        /// Remove everything.
        #[arg(long)]
        all: bool,
    },

    /// Show index statistics.
    Stats,
}

/// Element kind for pattern searches.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindArg {
    /// Class or interface.
    Type,
    /// Field.
    Field,
    /// Method.
    Method,
    /// Constructor.
    Constructor,
}

impl From<KindArg> for ElementKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Type => ElementKind::Type,
            KindArg::Field => ElementKind::Field,
            KindArg::Method => ElementKind::Method,
            KindArg::Constructor => ElementKind::Constructor,
        }
    }
}

/// Parse command-line arguments.
///
/// This function is the entry point for CLI argument parsing.
/// It returns the parsed Cli struct or exits on error.
pub fn parse_args() -> Cli {
    Cli::parse()
}

/// Build the queried element for `refs --member`.
///
/// `Class::name` is a field, `Class::name(sig)` a method, and
/// `Class::new(sig)` a constructor.
///
/// # Errors
/// Returns `MalformedReference` if the text lacks `::` or the class name
/// is invalid.
pub fn parse_member_element(text: &str) -> Result<ProgramElement> {
    let body = text.strip_prefix(REFERENCE_MARKER).unwrap_or(text);
    let (class_part, member) = body
        .split_once(MEMBER_SEPARATOR)
        .ok_or_else(|| ScriptRefError::malformed(text, "expected Class::member"))?;
    let class_name = normalize_class_name(class_part)?;

    match member.split_once('(') {
        None if member.is_empty() => Err(ScriptRefError::malformed(text, "empty member name")),
        None => Ok(ProgramElement::field(class_name, member)),
        Some((name, params)) => {
            let signature = format!("({}", params);
            if name == crate::reference::CONSTRUCTOR_NAME {
                Ok(ProgramElement::constructor(class_name, signature))
            } else {
                Ok(ProgramElement::method(class_name, name, signature))
            }
        }
    }
}

/// Read a records file, filling in `file` for entries that omit it.
///
/// # Errors
/// Returns `Io` if the file cannot be read, or `Json`/`Other` if it is
/// not a JSON array.
pub fn read_record_entries(path: &std::path::Path, file: &str) -> Result<Vec<Value>> {
    let json = std::fs::read_to_string(path).map_err(|e| ScriptRefError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let value: Value = serde_json::from_str(&json)?;
    let Value::Array(mut entries) = value else {
        return Err(ScriptRefError::Other(format!(
            "{}: expected a JSON array of entries",
            path.display()
        )));
    };
    for entry in &mut entries {
        if let Value::Object(map) = entry {
            map.entry("file")
                .or_insert_with(|| Value::String(file.to_string()));
        }
    }
    Ok(entries)
}

/// JSON form of a match.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct MatchPayload {
    /// Workspace-relative file.
    pub file: String,
    /// Offset of the matched token.
    pub offset: usize,
    /// Length of the matched token.
    pub length: usize,
    /// Literal reference text.
    pub reference: String,
}

impl From<&SearchMatch> for MatchPayload {
    fn from(found: &SearchMatch) -> Self {
        Self {
            file: found.file.clone(),
            offset: found.offset,
            length: found.length,
            reference: found.record.to_reference_text(),
        }
    }
}

/// JSON success payload for CLI responses.
#[derive(Serialize)]
pub struct CliSuccessPayload {
    /// Status indicator ("ok").
    pub status: &'static str,
    /// Human-readable message.
    pub message: String,
    /// Optional structured data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl CliSuccessPayload {
    /// Construct a payload containing only the message.
    pub fn message_only(message: String) -> Self {
        Self {
            status: "ok",
            message,
            data: None,
        }
    }

    /// Construct a payload with structured data.
    pub fn with_data(message: String, data: Value) -> Self {
        Self {
            status: "ok",
            message,
            data: Some(data),
        }
    }
}

/// JSON error payload for CLI responses.
#[derive(Serialize)]
pub struct CliErrorPayload {
    /// Status indicator ("error").
    pub status: &'static str,
    /// Structured error details.
    pub error: ErrorDetails,
}

/// Details for a CLI error payload.
#[derive(Serialize)]
pub struct ErrorDetails {
    /// Error kind identifier (MalformedReference, etc.).
    pub kind: &'static str,
    /// Human-readable message.
    pub message: String,
    /// Optional file context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl CliErrorPayload {
    /// Build payload from a ScriptRefError instance.
    pub fn from_error(error: &ScriptRefError) -> Self {
        CliErrorPayload {
            status: "error",
            error: ErrorDetails {
                kind: error.kind(),
                message: error.to_string(),
                file: error
                    .file_path()
                    .map(|path| path.to_string_lossy().to_string()),
            },
        }
    }
}
