//! Query engine tests: element queries with resolution, pattern queries.

use scriptref::index::ReferenceIndex;
use scriptref::model::{ElementKind, ProgramElement, TypeTable};
use scriptref::query::{Query, QueryEngine};
use scriptref::reference::{MemberReference, ReferenceRecord};
use std::collections::HashSet;
use std::sync::Arc;

fn member(file: &str, text: &str, offset: usize, member_offset: Option<usize>) -> ReferenceRecord {
    MemberReference::parse(text, file, offset, member_offset)
        .expect("valid reference")
        .into()
}

/// Two unrelated `getNumber` methods plus an inherited one.
fn model() -> TypeTable {
    let mut table = TypeTable::new();
    table.add_type("p.Counter", &[]);
    table.add_type("p.Ticket", &[]);
    table.add_type("p.SubCounter", &["p.Counter"]);
    table.add_callable("p.Counter", "getNumber", "()");
    table.add_callable("p.Ticket", "getNumber", "()");
    table.add_callable("p.Counter", "new", "(I)");
    table.add_field("p.Counter", "total");
    table
}

fn engine(model: TypeTable) -> QueryEngine {
    let index = Arc::new(ReferenceIndex::new());
    index.replace_file(
        "src/A.java",
        vec![
            member("src/A.java", "@p.Counter::getNumber()", 10, Some(21)),
            member("src/A.java", "@p.Ticket::getNumber()", 50, Some(60)),
            member("src/A.java", "@p.SubCounter::getNumber()", 90, Some(104)),
            member("src/A.java", "@p.Counter::new(I)", 130, Some(141)),
            member("src/A.java", "@p.SubCounter::total", 160, Some(174)),
        ],
    );
    index.replace_file(
        "src/B.java",
        vec![member("src/B.java", "@p.Missing::getNumber()", 5, Some(16))],
    );
    QueryEngine::new(index, Arc::new(model))
}

fn offsets(records: &scriptref::RecordSet) -> HashSet<usize> {
    records.iter().map(|r| r.class_offset()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_separates_unrelated_methods() {
        let engine = engine(model());
        let counter = ProgramElement::method("p.Counter", "getNumber", "()");

        let unresolved = engine.find_element(&counter, false);
        assert_eq!(unresolved.len(), 4);

        let resolved = engine.find_element(&counter, true);
        // Counter's own reference and the inherited one via SubCounter.
        assert_eq!(offsets(&resolved), HashSet::from([10, 90]));

        let ticket = ProgramElement::method("p.Ticket", "getNumber", "()");
        assert_eq!(offsets(&engine.find_element(&ticket, true)), HashSet::from([50]));
    }

    #[test]
    fn test_inherited_field_matches_declaring_type_query() {
        let engine = engine(model());
        let total = ProgramElement::field("p.Counter", "total");
        assert_eq!(offsets(&engine.find_element(&total, true)), HashSet::from([160]));
    }

    #[test]
    fn test_constructor_query() {
        let engine = engine(model());
        let ctor = ProgramElement::constructor("p.Counter", "(I)");
        assert_eq!(offsets(&engine.find_element(&ctor, true)), HashSet::from([130]));

        let other_overload = ProgramElement::constructor("p.Counter", "()");
        assert!(engine.find_element(&other_overload, true).is_empty());
    }

    #[test]
    fn test_unresolvable_candidates_are_dropped() {
        let mut table = model();
        table.remove_type("p.Ticket");
        let engine = engine(table);

        let ticket = ProgramElement::method("p.Ticket", "getNumber", "()");
        assert!(engine.find_element(&ticket, true).is_empty());
        // Without resolution the name-based candidates are all returned.
        assert_eq!(engine.find_element(&ticket, false).len(), 4);
    }

    #[test]
    fn test_type_query_uses_qualified_key() {
        let engine = engine(model());
        let counter = ProgramElement::type_element("p.Counter");
        assert_eq!(
            offsets(&engine.find_element(&counter, true)),
            HashSet::from([10, 130])
        );
    }

    #[test]
    fn test_run_dispatches_both_query_shapes() {
        let engine = engine(model());

        let element = Query::Element {
            element: ProgramElement::method("p.Ticket", "getNumber", "()"),
            resolve: true,
        };
        assert_eq!(engine.run(&element).unwrap().len(), 1);
        assert_eq!(element.kind(), ElementKind::Method);

        let pattern = Query::Pattern {
            pattern: "GETNUM*".to_string(),
            kind: ElementKind::Method,
            case_sensitive: false,
        };
        assert_eq!(engine.run(&pattern).unwrap().len(), 4);

        let types = Query::Pattern {
            pattern: "*Counter".to_string(),
            kind: ElementKind::Type,
            case_sensitive: true,
        };
        assert_eq!(engine.run(&types).unwrap().len(), 4);
    }
}
