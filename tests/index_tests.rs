//! Reference index tests: key derivation, incremental updates, patterns.

use scriptref::index::ReferenceIndex;
use scriptref::model::ElementKind;
use scriptref::reference::{MemberReference, ParamTypeReference, ReferenceRecord};
use scriptref::workspace::{AlwaysLive, FileLiveness, FsLiveness};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

fn member(file: &str, text: &str, offset: usize, member_offset: Option<usize>) -> ReferenceRecord {
    MemberReference::parse(text, file, offset, member_offset)
        .expect("valid reference")
        .into()
}

fn texts(records: &scriptref::RecordSet) -> HashSet<String> {
    records.iter().map(|r| r.to_reference_text()).collect()
}

fn scenario_index() -> ReferenceIndex {
    let index = ReferenceIndex::new();
    index.replace_file(
        "F",
        vec![
            member("F", "@A.B::go()", 10, Some(14)),
            member("F", "@A.B::stop()", 40, Some(44)),
        ],
    );
    index
}

/// Liveness check that takes a while per file.
struct SlowLiveness(Duration);

impl FileLiveness for SlowLiveness {
    fn is_live(&self, _file: &str) -> bool {
        std::thread::sleep(self.0);
        true
    }
}

/// Liveness check that reads the index it is asked about.
struct IndexBackedLiveness(Arc<ReferenceIndex>);

impl FileLiveness for IndexBackedLiveness {
    fn is_live(&self, file: &str) -> bool {
        !self.0.records_for_file(file).is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_replace_find_clear() {
        let index = scenario_index();

        let by_type = index.find_exact("A.B");
        assert_eq!(by_type.len(), 2);

        let go = index.find_pattern("go*", ElementKind::Method, true).unwrap();
        assert_eq!(texts(&go), HashSet::from(["@A.B::go()".to_string()]));

        index.clear_file("F");
        assert!(index.find_exact("A.B").is_empty());
    }

    #[test]
    fn test_nested_type_indexed_under_all_prefixes() {
        let index = ReferenceIndex::new();
        index.insert(member("src/X.java", "@com.acme.Outer$Inner", 5, None));

        for key in ["com.acme.Outer.Inner", "com.acme.Outer", "com.acme"] {
            assert_eq!(index.find_exact(key).len(), 1, "missing under {}", key);
        }
        assert!(index.find_exact("com").is_empty());
    }

    #[test]
    fn test_member_key_ignores_declaring_type_and_params() {
        let index = ReferenceIndex::new();
        index.insert(member("F", "@p.A::getNumber()", 0, Some(6)));
        index.insert(member("F", "@p.B::getNumber(I)", 30, Some(36)));
        index.insert(member("F", "@p.B::number", 60, Some(66)));

        assert_eq!(index.find_exact("::getNumber(...)").len(), 2);
        assert_eq!(index.find_exact("::number").len(), 1);
    }

    #[test]
    fn test_param_type_records_have_type_keys_only() {
        let index = ReferenceIndex::new();
        index.insert(ParamTypeReference::parse("Lp/Baz;", "F", 9).unwrap().into());

        assert_eq!(index.find_exact("p.Baz").len(), 1);
        assert_eq!(index.find_exact("p").len(), 1);
        assert_eq!(index.stats().element_keys, 2);
    }

    #[test]
    fn test_clear_file_is_idempotent() {
        let index = scenario_index();
        index.insert(member("G", "@A.B::go()", 3, Some(7)));

        index.clear_file("F");
        let after_once = (index.stats(), texts(&index.find_exact("A.B")));
        index.clear_file("F");
        let after_twice = (index.stats(), texts(&index.find_exact("A.B")));

        assert_eq!(after_once, after_twice);
        assert_eq!(index.find_exact("A.B").len(), 1);
        assert!(index
            .find_pattern("stop", ElementKind::Method, true)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_replace_file_drops_previous_generation() {
        let index = scenario_index();
        index.replace_file("F", vec![member("F", "@C.D::run()", 2, Some(6))]);

        assert!(index.find_exact("A.B").is_empty());
        assert!(index.find_exact("::go(...)").is_empty());
        assert_eq!(index.find_exact("C.D").len(), 1);
        assert_eq!(index.records_for_file("F").len(), 1);
    }

    #[test]
    fn test_replace_file_with_nothing_removes_file() {
        let index = scenario_index();
        index.replace_file("F", Vec::new());

        assert!(index.files().is_empty());
        assert_eq!(index.stats().element_keys, 0);
    }

    #[test]
    fn test_replace_file_skips_foreign_records() {
        let index = ReferenceIndex::new();
        index.replace_file(
            "F",
            vec![
                member("F", "@A.B", 0, None),
                member("Other", "@A.B", 0, None),
            ],
        );
        assert_eq!(index.files(), vec!["F".to_string()]);
        assert_eq!(index.find_exact("A.B").len(), 1);
    }

    #[test]
    fn test_empty_element_keys_are_pruned() {
        let index = scenario_index();
        assert_eq!(index.stats().element_keys, 4);

        index.clear_file("F");
        assert_eq!(index.stats().element_keys, 0);
    }

    #[test]
    fn test_duplicate_insert_is_ignored() {
        let index = ReferenceIndex::new();
        index.insert(member("F", "@A.B", 0, None));
        index.insert(member("F", "@A.B", 0, None));
        assert_eq!(index.stats().records, 1);
    }

    #[test]
    fn test_clear_container_uses_path_segments() {
        let index = ReferenceIndex::new();
        index.insert(member("proj/src/A.java", "@A", 0, None));
        index.insert(member("proj/B.java", "@A", 0, None));
        index.insert(member("project/C.java", "@A", 0, None));

        index.clear_container("proj");
        assert_eq!(index.files(), vec!["project/C.java".to_string()]);
    }

    #[test]
    fn test_clear_everything() {
        let index = scenario_index();
        index.clear();
        assert_eq!(index.stats(), Default::default());
    }

    #[test]
    fn test_results_are_copies() {
        let index = scenario_index();
        let before = index.find_exact("A.B");
        index.clear_file("F");
        assert_eq!(before.len(), 2);
    }

    #[test]
    fn test_wildcard_semantics_on_member_keys() {
        let index = ReferenceIndex::new();
        index.insert(member("F", "@p.A::sayHi()", 0, Some(6)));
        index.insert(member("F", "@p.A::sayHello()", 20, Some(26)));
        index.insert(member("F", "@p.A::saySomethingElse()", 40, Some(46)));

        let star = index.find_pattern("sayH*", ElementKind::Method, true).unwrap();
        assert_eq!(
            texts(&star),
            HashSet::from(["@p.A::sayHi()".to_string(), "@p.A::sayHello()".to_string()])
        );

        let question = index.find_pattern("sayH?", ElementKind::Method, true).unwrap();
        assert_eq!(texts(&question), HashSet::from(["@p.A::sayHi()".to_string()]));
    }

    #[test]
    fn test_method_pattern_strips_parameter_list() {
        let index = scenario_index();
        let found = index
            .find_pattern("A.B.go(int, String)", ElementKind::Method, true)
            .unwrap();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_field_and_method_patterns_do_not_cross() {
        let index = ReferenceIndex::new();
        index.insert(member("F", "@p.A::value", 0, Some(6)));
        index.insert(member("F", "@p.A::value()", 20, Some(26)));

        let fields = index.find_pattern("val*", ElementKind::Field, true).unwrap();
        assert_eq!(texts(&fields), HashSet::from(["@p.A::value".to_string()]));

        let methods = index.find_pattern("val*", ElementKind::Method, true).unwrap();
        assert_eq!(texts(&methods), HashSet::from(["@p.A::value()".to_string()]));
    }

    #[test]
    fn test_case_insensitive_simple_type_name() {
        let index = ReferenceIndex::new();
        index.insert(member("F", "@com.acme.Outer$InnerSub", 0, None));

        let found = index.find_pattern("innersub", ElementKind::Type, false).unwrap();
        assert_eq!(found.len(), 1);

        let strict = index.find_pattern("innersub", ElementKind::Type, true).unwrap();
        assert!(strict.is_empty());

        let exact_simple = index.find_pattern("InnerSub", ElementKind::Type, true).unwrap();
        assert_eq!(exact_simple.len(), 1);
    }

    #[test]
    fn test_qualified_type_pattern() {
        let index = ReferenceIndex::new();
        index.insert(member("F", "@com.acme.Foo", 0, None));
        index.insert(member("F", "@com.other.Foo", 20, None));

        let found = index.find_pattern("com.acme.*", ElementKind::Type, true).unwrap();
        assert_eq!(found.len(), 1);

        let exact = index.find_pattern("com.other.Foo", ElementKind::Type, true).unwrap();
        assert_eq!(exact.len(), 1);
    }

    #[test]
    fn test_size_counts_only_live_files() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        std::fs::write(dir.path().join("Live.java"), "class Live {}").unwrap();

        let index = ReferenceIndex::new();
        index.insert(member("Live.java", "@A", 0, None));
        index.insert(member("Live.java", "@B", 5, None));
        index.insert(member("Gone.java", "@A", 0, None));

        assert_eq!(index.size(&AlwaysLive), 3);
        assert_eq!(index.size(&FsLiveness::new(dir.path())), 2);
    }

    #[test]
    fn test_replace_is_atomic_for_concurrent_readers() {
        let index = Arc::new(ReferenceIndex::new());
        let generation = |n: usize| -> Vec<ReferenceRecord> {
            (0..8)
                .map(|i| member("F", &format!("@A.B::m{}x{}()", i, n), i * 20, Some(i * 20 + 5)))
                .collect()
        };
        index.replace_file("F", generation(0));

        let writer = {
            let index = Arc::clone(&index);
            std::thread::spawn(move || {
                for n in 1..200 {
                    index.replace_file("F", generation(n % 2));
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let index = Arc::clone(&index);
                std::thread::spawn(move || {
                    for _ in 0..500 {
                        let found = index.find_exact("A.B");
                        assert_eq!(found.len(), 8);
                        let generations: HashSet<bool> = found
                            .iter()
                            .map(|r| r.member_name().unwrap().ends_with("x0"))
                            .collect();
                        assert_eq!(generations.len(), 1, "mixed generations observed");
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
    }

    #[test]
    fn test_size_does_not_block_readers_during_liveness_checks() {
        let index = Arc::new(ReferenceIndex::new());
        for i in 0..5 {
            let file = format!("F{}.java", i);
            index.insert(member(&file, "@A.B", 0, None));
        }

        let counter = {
            let index = Arc::clone(&index);
            std::thread::spawn(move || index.size(&SlowLiveness(Duration::from_millis(100))))
        };
        std::thread::sleep(Duration::from_millis(50));

        let started = Instant::now();
        let found = index.find_exact("A.B");
        let waited = started.elapsed();

        assert_eq!(found.len(), 5);
        assert!(
            waited < Duration::from_millis(250),
            "reader waited {:?} behind liveness checks",
            waited
        );
        assert_eq!(counter.join().unwrap(), 5);
    }

    #[test]
    fn test_size_allows_liveness_to_query_the_index() {
        let index = Arc::new(ReferenceIndex::new());
        index.insert(member("F.java", "@A.B", 0, None));
        index.insert(member("G.java", "@A.C", 0, None));

        let liveness = IndexBackedLiveness(Arc::clone(&index));
        assert_eq!(index.size(&liveness), 2);
    }

    #[test]
    fn test_type_pattern_never_returns_member_keys() {
        let index = scenario_index();

        let found = index.find_pattern("::go(...)", ElementKind::Type, true).unwrap();
        assert!(found.is_empty());

        let found = index.find_pattern("::go(...)", ElementKind::Type, false).unwrap();
        assert!(found.is_empty());

        let found = index.find_pattern("go", ElementKind::Method, true).unwrap();
        assert_eq!(texts(&found), HashSet::from(["@A.B::go()".to_string()]));
    }
}
