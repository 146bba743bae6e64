//! Reference index: file index + element index behind one lock.
//!
//! - **File index**: source file → records found in that file.
//! - **Element index**: element key → records mentioning that element
//!   (see [`keys`] for how keys are derived).
//!
//! Both maps live in one [`IndexMaps`] guarded by a single mutex, so a
//! reader never observes one map updated and the other not. Every query
//! returns a fresh [`RecordSet`]; callers never hold the live sets.
//!
//! Element keys whose record set becomes empty are removed.

pub mod keys;
pub mod pattern;

use crate::error::Result;
use crate::model::ElementKind;
use crate::reference::{simple_name, ReferenceRecord};
use crate::workspace::FileLiveness;
use parking_lot::Mutex;
use pattern::{has_wildcards, WildcardPattern};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// A set of shared, immutable records.
pub type RecordSet = HashSet<Arc<ReferenceRecord>>;

/// Counts describing the index contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct IndexStats {
    /// Number of indexed files.
    pub files: usize,
    /// Number of records across all files.
    pub records: usize,
    /// Number of distinct element keys.
    pub element_keys: usize,
}

#[derive(Debug, Default)]
struct IndexMaps {
    files: HashMap<String, RecordSet>,
    elements: HashMap<String, RecordSet>,
}

impl IndexMaps {
    fn add_elements(&mut self, record: &Arc<ReferenceRecord>) {
        for key in keys::element_keys(record) {
            self.elements.entry(key).or_default().insert(Arc::clone(record));
        }
    }

    fn remove_elements(&mut self, record: &Arc<ReferenceRecord>) {
        for key in keys::element_keys(record) {
            if let Some(set) = self.elements.get_mut(&key) {
                set.remove(record);
                if set.is_empty() {
                    self.elements.remove(&key);
                }
            }
        }
    }

    fn insert(&mut self, record: Arc<ReferenceRecord>) {
        let inserted = self
            .files
            .entry(record.source_file().to_string())
            .or_default()
            .insert(Arc::clone(&record));
        if inserted {
            self.add_elements(&record);
        }
    }

    fn clear_file(&mut self, file: &str) {
        if let Some(records) = self.files.remove(file) {
            for record in &records {
                self.remove_elements(record);
            }
        }
    }
}

/// Workspace-wide index of script references to host-language elements.
///
/// Share it between threads behind an `Arc`; all methods take `&self`.
#[derive(Debug, Default)]
pub struct ReferenceIndex {
    maps: Mutex<IndexMaps>,
}

impl ReferenceIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one record under its source file and all of its element keys.
    pub fn insert(&self, record: ReferenceRecord) {
        self.maps.lock().insert(Arc::new(record));
    }

    /// Replace everything known about `file` with `records`.
    ///
    /// Old records are removed from both maps and the new ones added under
    /// the same lock acquisition. Records whose source file differs from
    /// `file` are skipped.
    pub fn replace_file<I>(&self, file: &str, records: I)
    where
        I: IntoIterator<Item = ReferenceRecord>,
    {
        let fresh: Vec<Arc<ReferenceRecord>> = records
            .into_iter()
            .filter(|record| {
                let matches = record.source_file() == file;
                if !matches {
                    log::warn!(
                        "Skipping record for '{}' while re-indexing '{}'",
                        record.source_file(),
                        file
                    );
                }
                matches
            })
            .map(Arc::new)
            .collect();

        let mut maps = self.maps.lock();
        maps.clear_file(file);
        for record in fresh {
            maps.insert(record);
        }
        log::debug!(
            "Re-indexed '{}': {} records",
            file,
            maps.files.get(file).map_or(0, HashSet::len)
        );
    }

    /// Remove all records belonging to one file.
    pub fn clear_file(&self, file: &str) {
        self.maps.lock().clear_file(file);
    }

    /// Remove all records of files rooted under `container`
    /// (the path itself, or anything below `container/`).
    pub fn clear_container(&self, container: &str) {
        let container = container.trim_end_matches('/');
        let mut maps = self.maps.lock();
        let doomed: Vec<String> = maps
            .files
            .keys()
            .filter(|file| is_under(file, container))
            .cloned()
            .collect();
        for file in &doomed {
            maps.clear_file(file);
        }
        log::debug!("Cleared {} files under '{}'", doomed.len(), container);
    }

    /// Empty both maps.
    pub fn clear(&self) {
        let mut maps = self.maps.lock();
        maps.files.clear();
        maps.elements.clear();
    }

    /// Copy of the records stored under exactly `key`.
    pub fn find_exact(&self, key: &str) -> RecordSet {
        self.maps
            .lock()
            .elements
            .get(key)
            .cloned()
            .unwrap_or_default()
    }

    /// Union of records under every element key matching `pattern`.
    ///
    /// - `Type` with no `.` in the pattern matches simple names only.
    /// - `Field` patterns become member keys; `Method`/`Constructor`
    ///   patterns lose any parameter list and become callable member keys.
    /// - Without wildcards, case-sensitive and not a simple-name search,
    ///   this is a single exact lookup. A key of the wrong kind for `kind`
    ///   matches nothing.
    ///
    /// # Errors
    /// Returns `InvalidPattern` if the pattern cannot be compiled.
    pub fn find_pattern(
        &self,
        pattern: &str,
        kind: ElementKind,
        case_sensitive: bool,
    ) -> Result<RecordSet> {
        let (key_pattern, simple_names) = key_pattern(pattern, kind);

        if case_sensitive && !simple_names && !has_wildcards(&key_pattern) {
            if !accepts_key(kind, &key_pattern) {
                return Ok(RecordSet::new());
            }
            return Ok(self.find_exact(&key_pattern));
        }

        let matcher = WildcardPattern::new(&key_pattern, case_sensitive)?;
        let maps = self.maps.lock();
        let mut found = RecordSet::new();
        for (key, records) in &maps.elements {
            if !accepts_key(kind, key) {
                continue;
            }
            let candidate = if simple_names { simple_name(key) } else { key.as_str() };
            if matcher.matches(candidate) {
                found.extend(records.iter().cloned());
            }
        }
        Ok(found)
    }

    /// Copy of the records currently stored for `file`.
    pub fn records_for_file(&self, file: &str) -> RecordSet {
        self.maps.lock().files.get(file).cloned().unwrap_or_default()
    }

    /// Sorted list of indexed files.
    pub fn files(&self) -> Vec<String> {
        let mut files: Vec<String> = self.maps.lock().files.keys().cloned().collect();
        files.sort();
        files
    }

    /// Number of records whose file is still live in the workspace.
    ///
    /// Liveness is checked outside the index lock; `liveness` may call
    /// back into the index.
    pub fn size(&self, liveness: &dyn FileLiveness) -> usize {
        let counts: Vec<(String, usize)> = self
            .maps
            .lock()
            .files
            .iter()
            .map(|(file, records)| (file.clone(), records.len()))
            .collect();
        counts
            .into_iter()
            .filter(|(file, _)| liveness.is_live(file))
            .map(|(_, count)| count)
            .sum()
    }

    /// Counts of files, records and element keys.
    pub fn stats(&self) -> IndexStats {
        let maps = self.maps.lock();
        IndexStats {
            files: maps.files.len(),
            records: maps.files.values().map(HashSet::len).sum(),
            element_keys: maps.elements.len(),
        }
    }

    /// All records, ordered by file, then offset, then reference text.
    pub fn snapshot(&self) -> Vec<Arc<ReferenceRecord>> {
        let mut records: Vec<Arc<ReferenceRecord>> = self
            .maps
            .lock()
            .files
            .values()
            .flat_map(|set| set.iter().cloned())
            .collect();
        records.sort_by(|a, b| {
            (a.source_file(), a.class_offset(), a.to_reference_text()).cmp(&(
                b.source_file(),
                b.class_offset(),
                b.to_reference_text(),
            ))
        });
        records
    }
}

fn is_under(file: &str, container: &str) -> bool {
    container.is_empty()
        || file == container
        || file
            .strip_prefix(container)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Turn a user pattern into an element-key pattern.
///
/// Returns the key pattern and whether it applies to simple type names.
fn key_pattern(pattern: &str, kind: ElementKind) -> (String, bool) {
    let pattern = pattern.trim();
    match kind {
        ElementKind::Type => {
            let normalized = pattern.replace('$', ".");
            let simple = !normalized.contains('.');
            (normalized, simple)
        }
        ElementKind::Field => (keys::member_key(member_name(pattern), false), false),
        ElementKind::Method | ElementKind::Constructor => {
            let without_params = pattern.split_once('(').map_or(pattern, |(name, _)| name);
            (keys::member_key(member_name(without_params), true), false)
        }
    }
}

/// Drop any `Type::` or `Type.` qualifier from a member pattern.
fn member_name(pattern: &str) -> &str {
    if let Some((_, name)) = pattern.rsplit_once(keys::MEMBER_KEY_PREFIX) {
        return name;
    }
    pattern.rsplit_once('.').map_or(pattern, |(_, name)| name)
}

fn accepts_key(kind: ElementKind, key: &str) -> bool {
    match kind {
        ElementKind::Type => !keys::is_member_key(key),
        ElementKind::Field => keys::is_member_key(key) && !keys::is_callable_key(key),
        ElementKind::Method | ElementKind::Constructor => keys::is_callable_key(key),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_pattern_by_kind() {
        assert_eq!(key_pattern("InnerSub", ElementKind::Type), ("InnerSub".to_string(), true));
        assert_eq!(
            key_pattern("com.acme.Outer$Inner", ElementKind::Type),
            ("com.acme.Outer.Inner".to_string(), false)
        );
        assert_eq!(key_pattern("count", ElementKind::Field), ("::count".to_string(), false));
        assert_eq!(
            key_pattern("p.Foo.go(int, String)", ElementKind::Method),
            ("::go(...)".to_string(), false)
        );
        assert_eq!(
            key_pattern("p.Foo::say*", ElementKind::Method),
            ("::say*(...)".to_string(), false)
        );
    }

    #[test]
    fn test_is_under() {
        assert!(is_under("proj/src/A.java", "proj"));
        assert!(is_under("proj", "proj"));
        assert!(!is_under("project/src/A.java", "proj"));
        assert!(is_under("anything", ""));
    }

    #[test]
    fn test_accepts_key() {
        assert!(accepts_key(ElementKind::Type, "A.B"));
        assert!(!accepts_key(ElementKind::Type, "::go(...)"));
        assert!(accepts_key(ElementKind::Field, "::count"));
        assert!(!accepts_key(ElementKind::Field, "::go(...)"));
        assert!(accepts_key(ElementKind::Constructor, "::new(...)"));
    }
}
