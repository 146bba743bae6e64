//! Search adapter for a host search framework.
//!
//! The host hands over a [`QueryDescriptor`], a [`SearchScope`] and a
//! [`MatchSink`]. Matching records are turned into `(file, offset, length)`
//! matches. Nothing escapes this boundary: errors and panics from the
//! query engine or from host callbacks are logged and reported as "no
//! matches".

use crate::error::ScriptRefError;
use crate::model::ElementKind;
use crate::query::{Query, QueryEngine};
use crate::reference::ReferenceRecord;
use std::collections::HashSet;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// What kind of occurrences the host asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitTo {
    /// References only.
    References,
    /// Declarations and references.
    AllOccurrences,
    /// Read accesses (treated as all references).
    ReadAccesses,
    /// Write accesses (treated as all references).
    WriteAccesses,
    /// Declarations (never found in script code).
    Declarations,
    /// Implementors (never found in script code).
    Implementors,
}

impl LimitTo {
    /// Whether script references can satisfy this mode.
    pub fn reports_references(&self) -> bool {
        !matches!(self, LimitTo::Declarations | LimitTo::Implementors)
    }
}

/// A host search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryDescriptor {
    /// The query to run.
    pub query: Query,
    /// Occurrence filter.
    pub limit_to: LimitTo,
}

/// Restricts which files may produce matches.
pub trait SearchScope {
    /// Whether `file` lies inside the search scope.
    fn encloses(&self, file: &str) -> bool;
}

/// Scope covering every indexed file.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkspaceScope;

impl SearchScope for WorkspaceScope {
    fn encloses(&self, _file: &str) -> bool {
        true
    }
}

/// Scope covering an explicit set of files.
#[derive(Debug, Clone, Default)]
pub struct FileSetScope {
    files: HashSet<String>,
}

impl FileSetScope {
    /// Scope over `files`.
    pub fn new<I, S>(files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            files: files.into_iter().map(Into::into).collect(),
        }
    }
}

impl SearchScope for FileSetScope {
    fn encloses(&self, file: &str) -> bool {
        self.files.contains(file)
    }
}

impl<F> SearchScope for F
where
    F: Fn(&str) -> bool,
{
    fn encloses(&self, file: &str) -> bool {
        self(file)
    }
}

/// One reportable match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchMatch {
    /// Workspace-relative file.
    pub file: String,
    /// Character offset of the matched token.
    pub offset: usize,
    /// Length of the matched token in characters.
    pub length: usize,
    /// The record behind this match.
    pub record: Arc<ReferenceRecord>,
}

impl SearchMatch {
    /// Match covering the token relevant to a search for `kind`.
    ///
    /// Type searches report the type-name token; member searches report
    /// the member-name token. A nested-type reference found through its
    /// enclosing type (`p.Outer$Inner` for `p.Outer`) spans the whole
    /// type-name token.
    pub fn from_record(record: Arc<ReferenceRecord>, kind: ElementKind) -> Self {
        let (offset, length) = match (kind, record.member()) {
            (ElementKind::Type, _) | (_, None) => (
                record.class_offset(),
                record.raw_class_name().chars().count(),
            ),
            (_, Some(member)) => (member.offset(), member.name().chars().count()),
        };
        Self {
            file: record.source_file().to_string(),
            offset,
            length,
            record,
        }
    }
}

/// Receives matches from the adapter.
pub trait MatchSink {
    /// Accept one match.
    fn report(&mut self, found: SearchMatch);
}

impl MatchSink for Vec<SearchMatch> {
    fn report(&mut self, found: SearchMatch) {
        self.push(found);
    }
}

/// Bridges host search requests to the query engine.
#[derive(Debug, Clone)]
pub struct SearchAdapter {
    engine: QueryEngine,
}

impl SearchAdapter {
    /// Adapter over `engine`.
    pub fn new(engine: QueryEngine) -> Self {
        Self { engine }
    }

    /// Run `descriptor`, reporting in-scope matches ordered by file and
    /// offset. Returns the number of matches reported.
    pub fn search(
        &self,
        descriptor: &QueryDescriptor,
        scope: &dyn SearchScope,
        sink: &mut dyn MatchSink,
    ) -> usize {
        if !descriptor.limit_to.reports_references() {
            log::debug!(
                "Search mode {:?} has no script occurrences",
                descriptor.limit_to
            );
            return 0;
        }

        let matches = match self.collect(descriptor, scope) {
            Ok(matches) => matches,
            Err(e) => {
                log::error!("Script reference search failed: {}", e);
                return 0;
            }
        };

        let count = matches.len();
        for found in matches {
            sink.report(found);
        }
        count
    }

    fn collect(
        &self,
        descriptor: &QueryDescriptor,
        scope: &dyn SearchScope,
    ) -> Result<Vec<SearchMatch>, ScriptRefError> {
        let kind = descriptor.query.kind();
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            self.engine.run(&descriptor.query).map(|records| {
                let mut matches: Vec<SearchMatch> = records
                    .into_iter()
                    .filter(|record| scope.encloses(record.source_file()))
                    .map(|record| SearchMatch::from_record(record, kind))
                    .collect();
                matches.sort_by(|a, b| (&a.file, a.offset).cmp(&(&b.file, b.offset)));
                matches
            })
        }));

        match outcome {
            Ok(result) => result,
            Err(payload) => {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                Err(ScriptRefError::ResolutionPanicked(message))
            }
        }
    }
}
