//! Scriptref error types.
//!
//! All errors are typed and provide root cause information.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for scriptref operations.
#[derive(Error, Debug)]
pub enum ScriptRefError {
    /// I/O error during file operations.
    #[error("I/O error for path {path}: {source}")]
    Io {
        /// The file path that caused the I/O error.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Reference text could not be parsed into a record.
    #[error("Malformed reference '{text}': {reason}")]
    MalformedReference {
        /// The offending reference text.
        text: String,
        /// Why parsing failed.
        reason: String,
    },

    /// Member signature could not be parsed.
    #[error("Malformed signature '{signature}': {reason}")]
    MalformedSignature {
        /// The offending signature.
        signature: String,
        /// Why parsing failed.
        reason: String,
    },

    /// Search pattern could not be compiled.
    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The offending pattern.
        pattern: String,
        /// Why compilation failed.
        reason: String,
    },

    /// A persisted index entry could not be turned back into a record.
    #[error("Malformed index entry #{position}: {reason}")]
    MalformedEntry {
        /// Zero-based position of the entry in the document.
        position: usize,
        /// Why the entry was rejected.
        reason: String,
    },

    /// An external collaborator panicked while answering a query.
    #[error("Resolution panicked: {0}")]
    ResolutionPanicked(String),

    /// Generic error with context.
    #[error("{0}")]
    Other(String),
}

impl ScriptRefError {
    /// Stable identifier for this error kind (used in JSON payloads).
    pub fn kind(&self) -> &'static str {
        match self {
            ScriptRefError::Io { .. } => "Io",
            ScriptRefError::Json(_) => "Json",
            ScriptRefError::MalformedReference { .. } => "MalformedReference",
            ScriptRefError::MalformedSignature { .. } => "MalformedSignature",
            ScriptRefError::InvalidPattern { .. } => "InvalidPattern",
            ScriptRefError::MalformedEntry { .. } => "MalformedEntry",
            ScriptRefError::ResolutionPanicked(_) => "ResolutionPanicked",
            ScriptRefError::Other(_) => "Other",
        }
    }

    /// File path associated with this error, if any.
    pub fn file_path(&self) -> Option<&std::path::Path> {
        match self {
            ScriptRefError::Io { path, .. } => Some(path.as_path()),
            _ => None,
        }
    }

    /// Build a malformed-reference error.
    pub(crate) fn malformed(text: &str, reason: impl Into<String>) -> Self {
        ScriptRefError::MalformedReference {
            text: text.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<std::io::Error> for ScriptRefError {
    fn from(err: std::io::Error) -> Self {
        ScriptRefError::Io {
            path: PathBuf::from("<unknown>"),
            source: err,
        }
    }
}

/// Result type alias for scriptref operations.
pub type Result<T> = std::result::Result<T, ScriptRefError>;
