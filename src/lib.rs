//! Scriptref: cross-language symbol reference index.
//!
//! This library records where host-language types and members are
//! referenced from embedded native script blocks, keeps that index
//! consistent under file-level re-indexing, persists it per workspace,
//! and answers element and wildcard-pattern reference queries.

#![warn(missing_docs)]
// env_logger is used by src/main.rs (binary), not this library
#![expect(unused_crate_dependencies)]

pub mod cli;
pub mod error;
pub mod index;
pub mod model;
pub mod persist;
pub mod query;
pub mod reference;
pub mod search;
pub mod workspace;

/// Re-export common error types for convenience.
pub use error::{Result, ScriptRefError};

/// Re-export index types for convenience.
pub use index::{RecordSet, ReferenceIndex};

/// Re-export record types for convenience.
pub use reference::{MemberReference, ParamTypeReference, ReferenceRecord};

/// Scriptref version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
