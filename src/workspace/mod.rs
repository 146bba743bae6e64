//! Workspace configuration and the shared index handle.
//!
//! One [`WorkspaceIndex`] is created by the hosting application and handed
//! to whoever needs the index. The underlying [`ReferenceIndex`] is loaded
//! from disk on first access and written back on [`WorkspaceIndex::save`].

use crate::index::ReferenceIndex;
use crate::persist;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

/// Default index location, relative to the workspace root.
pub const DEFAULT_INDEX_PATH: &str = ".scriptref/index.json";

/// Answers whether an indexed file is still part of the workspace.
pub trait FileLiveness {
    /// `true` if `file` (workspace-relative) exists and is active.
    fn is_live(&self, file: &str) -> bool;
}

/// Treats every file as live.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysLive;

impl FileLiveness for AlwaysLive {
    fn is_live(&self, _file: &str) -> bool {
        true
    }
}

/// Checks that the file exists under a workspace root on disk.
#[derive(Debug, Clone)]
pub struct FsLiveness {
    root: PathBuf,
}

impl FsLiveness {
    /// Liveness rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl FileLiveness for FsLiveness {
    fn is_live(&self, file: &str) -> bool {
        self.root.join(file).is_file()
    }
}

/// Where the workspace lives and where its index is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexConfig {
    /// Workspace root directory.
    pub workspace_root: PathBuf,
    /// Persisted index document.
    pub index_path: PathBuf,
}

impl IndexConfig {
    /// Configuration for `root` with the default index location.
    pub fn for_root(root: impl Into<PathBuf>) -> Self {
        let workspace_root = root.into();
        let index_path = workspace_root.join(DEFAULT_INDEX_PATH);
        Self {
            workspace_root,
            index_path,
        }
    }

    /// Override the persisted index location.
    pub fn with_index_path(mut self, index_path: impl Into<PathBuf>) -> Self {
        self.index_path = index_path.into();
        self
    }

    /// Liveness check for files of this workspace.
    pub fn liveness(&self) -> FsLiveness {
        FsLiveness::new(&self.workspace_root)
    }
}

/// Lazily loaded, explicitly saved index for one workspace.
#[derive(Debug)]
pub struct WorkspaceIndex {
    config: IndexConfig,
    index: OnceLock<Arc<ReferenceIndex>>,
}

impl WorkspaceIndex {
    /// Handle for `config`. Nothing is read until [`Self::index`].
    pub fn new(config: IndexConfig) -> Self {
        Self {
            config,
            index: OnceLock::new(),
        }
    }

    /// Configuration in use.
    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// The index, loading it from disk on first call.
    pub fn index(&self) -> Arc<ReferenceIndex> {
        Arc::clone(
            self.index
                .get_or_init(|| Arc::new(persist::load_or_empty(&self.config.index_path))),
        )
    }

    /// Whether the index has been loaded yet.
    pub fn is_loaded(&self) -> bool {
        self.index.get().is_some()
    }

    /// Write the index back to disk.
    ///
    /// Failures are logged and reported as `false`; the in-memory index
    /// stays valid. Saving an index that was never loaded is a no-op.
    pub fn save(&self) -> bool {
        let Some(index) = self.index.get() else {
            return true;
        };
        match persist::save(index, &self.config.index_path) {
            Ok(count) => {
                log::debug!(
                    "Saved {} records to {}",
                    count,
                    self.config.index_path.display()
                );
                true
            }
            Err(e) => {
                log::error!(
                    "Failed to save index to {}: {}",
                    self.config.index_path.display(),
                    e
                );
                false
            }
        }
    }

    /// Records in files that still exist under the workspace root.
    pub fn live_size(&self) -> usize {
        self.index().size(&self.config.liveness())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_index_path() {
        let config = IndexConfig::for_root("/ws");
        assert_eq!(config.index_path, PathBuf::from("/ws/.scriptref/index.json"));
        let config = config.with_index_path("/tmp/idx.json");
        assert_eq!(config.index_path, PathBuf::from("/tmp/idx.json"));
    }
}
