//! On-disk form of the reference index.
//!
//! The index is stored as one JSON document per workspace:
//!
//! ```json
//! {
//!   "version": 1,
//!   "saved_at": "2025-01-01T00:00:00Z",
//!   "entries": [
//!     { "kind": "member", "reference": "@A.B::go()", "file": "F", "offset": 10, "member_offset": 14 },
//!     { "kind": "param_type", "reference": "Lp/Baz;", "file": "F", "offset": 30 }
//!   ]
//! }
//! ```
//!
//! Only the file index is written; the element index is rebuilt by
//! re-inserting every decoded record. Entries are decoded one by one and a
//! bad entry is logged and skipped.

use crate::error::{Result, ScriptRefError};
use crate::index::ReferenceIndex;
use crate::reference::{MemberReference, ParamTypeReference, ReferenceRecord};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Current document format version.
pub const FORMAT_VERSION: u32 = 1;

/// One persisted record, tagged by variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IndexEntry {
    /// Type or member reference.
    Member {
        /// Literal reference text (`@class::member(sig)`).
        reference: String,
        /// Workspace-relative source file.
        file: String,
        /// Offset of the type-name token.
        offset: usize,
        /// Offset of the member-name token, for member references.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        member_offset: Option<usize>,
    },
    /// Parameter type inside a signature.
    ParamType {
        /// Type as written.
        reference: String,
        /// Workspace-relative source file.
        file: String,
        /// Offset of the type token.
        offset: usize,
    },
}

impl IndexEntry {
    /// Persisted form of a record.
    pub fn from_record(record: &ReferenceRecord) -> Self {
        match record {
            ReferenceRecord::Member(r) => IndexEntry::Member {
                reference: r.to_reference_text(),
                file: r.source_file().to_string(),
                offset: r.class_offset(),
                member_offset: r.member().map(|m| m.offset()),
            },
            ReferenceRecord::ParamType(r) => IndexEntry::ParamType {
                reference: r.raw_class_name().to_string(),
                file: r.source_file().to_string(),
                offset: r.offset(),
            },
        }
    }

    /// Rebuild the record through the variant's parse routine.
    ///
    /// # Errors
    /// Returns `MalformedReference` if the reference text does not parse.
    pub fn into_record(self) -> Result<ReferenceRecord> {
        match self {
            IndexEntry::Member {
                reference,
                file,
                offset,
                member_offset,
            } => Ok(MemberReference::parse(&reference, file, offset, member_offset)?.into()),
            IndexEntry::ParamType {
                reference,
                file,
                offset,
            } => Ok(ParamTypeReference::parse(&reference, file, offset)?.into()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct IndexDocument {
    version: u32,
    #[serde(default)]
    saved_at: Option<String>,
    entries: Vec<Value>,
}

/// Decode raw entries, skipping (and logging) every malformed one.
pub fn decode_entries(entries: Vec<Value>) -> Vec<ReferenceRecord> {
    entries
        .into_iter()
        .enumerate()
        .filter_map(|(position, value)| match decode_entry(position, value) {
            Ok(record) => Some(record),
            Err(e) => {
                log::warn!("Skipping index entry: {}", e);
                None
            }
        })
        .collect()
}

fn decode_entry(position: usize, value: Value) -> Result<ReferenceRecord> {
    let entry: IndexEntry =
        serde_json::from_value(value).map_err(|e| ScriptRefError::MalformedEntry {
            position,
            reason: e.to_string(),
        })?;
    entry
        .into_record()
        .map_err(|e| ScriptRefError::MalformedEntry {
            position,
            reason: e.to_string(),
        })
}

/// Load an index document.
///
/// # Errors
/// Returns `Io` if the file cannot be read, or `Json`/`Other` if the
/// document as a whole is unusable. Individual bad entries are skipped.
pub fn load(path: &Path) -> Result<ReferenceIndex> {
    let json = fs::read_to_string(path).map_err(|e| ScriptRefError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let document: IndexDocument = serde_json::from_str(&json)?;

    if document.version > FORMAT_VERSION {
        return Err(ScriptRefError::Other(format!(
            "Unsupported index format version {} (expected <= {})",
            document.version, FORMAT_VERSION
        )));
    }

    let index = ReferenceIndex::new();
    let total = document.entries.len();
    let records = decode_entries(document.entries);
    let loaded = records.len();
    for record in records {
        index.insert(record);
    }
    log::debug!(
        "Loaded {} of {} index entries from {}",
        loaded,
        total,
        path.display()
    );
    Ok(index)
}

/// Load an index document, starting empty if it cannot be read.
pub fn load_or_empty(path: &Path) -> ReferenceIndex {
    match load(path) {
        Ok(index) => index,
        Err(ScriptRefError::Io { source, .. })
            if source.kind() == std::io::ErrorKind::NotFound =>
        {
            log::debug!("No index at {}, starting empty", path.display());
            ReferenceIndex::new()
        }
        Err(e) => {
            log::warn!(
                "Could not load index from {}, starting empty: {}",
                path.display(),
                e
            );
            ReferenceIndex::new()
        }
    }
}

/// Write the index to `path`, replacing any previous document atomically.
///
/// Returns the number of entries written.
///
/// # Errors
/// Returns `Io` or `Json` if the document cannot be written.
pub fn save(index: &ReferenceIndex, path: &Path) -> Result<usize> {
    let entries = index
        .snapshot()
        .iter()
        .map(|record| serde_json::to_value(IndexEntry::from_record(record)))
        .collect::<std::result::Result<Vec<Value>, _>>()?;
    let count = entries.len();

    let document = IndexDocument {
        version: FORMAT_VERSION,
        saved_at: Some(chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)),
        entries,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::path::PathBuf::from("."),
    };
    let io_err = |source: std::io::Error| ScriptRefError::Io {
        path: path.to_path_buf(),
        source,
    };

    fs::create_dir_all(&dir).map_err(io_err)?;
    let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(io_err)?;
    serde_json::to_writer_pretty(&mut tmp, &document)?;
    tmp.flush().map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entry_tags() {
        let record: ReferenceRecord = MemberReference::parse("@A.B::go()", "F", 10, Some(14))
            .unwrap()
            .into();
        let value = serde_json::to_value(IndexEntry::from_record(&record)).unwrap();
        assert_eq!(
            value,
            json!({"kind": "member", "reference": "@A.B::go()", "file": "F", "offset": 10, "member_offset": 14})
        );
    }

    #[test]
    fn test_type_only_entry_omits_member_offset() {
        let record: ReferenceRecord = MemberReference::parse("@A.B", "F", 3, None).unwrap().into();
        let value = serde_json::to_value(IndexEntry::from_record(&record)).unwrap();
        assert!(value.get("member_offset").is_none());
    }

    #[test]
    fn test_decode_skips_malformed() {
        let records = decode_entries(vec![
            json!({"kind": "member", "reference": "@A.B", "file": "F", "offset": 1}),
            json!({"kind": "member", "file": "F", "offset": 1}),
            json!({"kind": "mystery", "reference": "@A.B", "file": "F", "offset": 1}),
            json!({"kind": "member", "reference": "@A..B", "file": "F", "offset": 1}),
            json!({"kind": "param_type", "reference": "Lp/Baz;", "file": "F", "offset": 9}),
        ]);
        assert_eq!(records.len(), 2);
    }
}
