//! Property tests: indexes stay in lockstep with the document table

use crate::common::*;
use minidoc::{Candidates, IndexFields, Matcher, SelectorMatcher};
use proptest::prelude::*;

const NAMES: [&str; 3] = ["ann", "bob", "cy"];

#[derive(Debug, Clone)]
enum FieldValue {
    Missing,
    Null,
    Int(i64),
    Name(&'static str),
}

impl FieldValue {
    fn apply(&self, doc: &mut Document, field: &str) {
        match self {
            FieldValue::Missing => {
                doc.remove(field);
            }
            FieldValue::Null => {
                doc.set(field, Value::Null);
            }
            FieldValue::Int(i) => {
                doc.set(field, *i);
            }
            FieldValue::Name(s) => {
                doc.set(field, *s);
            }
        }
    }
}

#[derive(Debug, Clone)]
enum Op {
    Insert(u8, FieldValue, FieldValue),
    Update(u8, FieldValue, FieldValue),
    Remove(u8),
}

fn arb_name() -> impl Strategy<Value = FieldValue> {
    prop_oneof![
        Just(FieldValue::Missing),
        Just(FieldValue::Null),
        (0..NAMES.len()).prop_map(|i| FieldValue::Name(NAMES[i])),
    ]
}

fn arb_age() -> impl Strategy<Value = FieldValue> {
    prop_oneof![
        Just(FieldValue::Missing),
        Just(FieldValue::Null),
        (0i64..3).prop_map(FieldValue::Int),
    ]
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u8..6, arb_name(), arb_age()).prop_map(|(id, n, a)| Op::Insert(id, n, a)),
        (0u8..6, arb_name(), arb_age()).prop_map(|(id, n, a)| Op::Update(id, n, a)),
        (0u8..6).prop_map(Op::Remove),
    ]
}

fn run(ops: &[Op]) -> Collection {
    let mut c = Collection::new("prop");
    c.ensure_index(["name"]).unwrap();
    c.ensure_index(["name", "age"]).unwrap();
    for op in ops {
        match op {
            Op::Insert(id, name, age) => {
                let mut d = Document::with_id(id.to_string());
                name.apply(&mut d, "name");
                age.apply(&mut d, "age");
                // Duplicate ids are rejected without changing state.
                let _ = c.insert(d);
            }
            Op::Update(id, name, age) => {
                let (name, age) = (name.clone(), age.clone());
                let modifier = move |d: &mut Document| -> minidoc::Result<()> {
                    name.apply(d, "name");
                    age.apply(d, "age");
                    Ok(())
                };
                c.update(Selector::id(id.to_string()), &modifier).unwrap();
            }
            Op::Remove(id) => {
                c.remove(Selector::id(id.to_string())).unwrap();
            }
        }
    }
    c
}

fn projection(doc: &Document, fields: &IndexFields) -> Selector {
    fields.as_slice().iter().fold(Selector::all(), |s, f| {
        s.eq(f.clone(), doc.get(f).cloned().unwrap_or(Value::Null))
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_every_document_is_filed_under_its_projection(ops in prop::collection::vec(arb_op(), 0..40)) {
        let c = run(&ops);
        for fields in c.indexes() {
            let index = c.store().index(&fields).unwrap();
            prop_assert_eq!(index.posting_count(), c.len());
            for (id, doc) in c.store().iter() {
                prop_assert!(index.contains(doc));
                let found = index.matching_ids(&projection(doc, &fields)).unwrap();
                prop_assert!(found.contains(id));
            }
        }
    }

    #[test]
    fn prop_removed_documents_leave_no_posting(ops in prop::collection::vec(arb_op(), 0..40)) {
        let mut c = run(&ops);
        let snapshot: Vec<Document> = c.store().iter().map(|(_, d)| d.clone()).collect();
        c.remove(sel(json!({}))).unwrap();
        for fields in c.indexes() {
            let index = c.store().index(&fields).unwrap();
            prop_assert_eq!(index.posting_count(), 0);
            for doc in &snapshot {
                let found = index.matching_ids(&projection(doc, &fields)).unwrap();
                prop_assert!(found.is_empty());
            }
        }
    }

    #[test]
    fn prop_candidates_never_miss_a_match(
        ops in prop::collection::vec(arb_op(), 0..40),
        name in arb_name(),
        age in arb_age(),
    ) {
        let c = run(&ops);
        let mut probe = Document::new();
        name.apply(&mut probe, "name");
        age.apply(&mut probe, "age");
        let selector = projection(&probe, &IndexFields::new(["name", "age"]).unwrap());
        let matcher = SelectorMatcher::new(selector.clone()).unwrap();

        let scanned: Vec<DocId> = c
            .store()
            .iter()
            .filter(|(_, d)| matcher.document_matches(d).matched)
            .map(|(id, _)| id.clone())
            .collect();

        match c.store().candidates(&selector) {
            Candidates::All => prop_assert!(false, "covered selector fell back to a scan"),
            Candidates::Ids(candidates) => {
                for id in &scanned {
                    prop_assert!(candidates.contains(id));
                }
            }
        }

        let mut found = ids_of(&c.find(selector, FindOptions::new()).unwrap());
        found.sort();
        prop_assert_eq!(found, scanned);
    }
}
