//! Candidate resolution across several indexes

use crate::common::*;
use minidoc::Candidates;

fn indexed_people() -> Collection {
    let mut c = collection("people");
    c.ensure_index(["name"]).unwrap();
    c.ensure_index(["age"]).unwrap();
    for d in [
        json!({"_id": "1", "name": "one", "age": 1}),
        json!({"_id": "2", "name": "one", "age": 2}),
        json!({"_id": "3", "name": "two", "age": 1}),
        json!({"_id": "4", "name": "two", "age": 2}),
    ] {
        c.insert_json(d).unwrap();
    }
    c
}

#[test]
fn test_intersection_of_covering_indexes() {
    let c = indexed_people();
    assert_eq!(
        c.store().candidates(&sel(json!({"name": "one", "age": 2}))),
        Candidates::Ids(ids(&["2"]))
    );
}

#[test]
fn test_disjoint_indexes_short_circuit() {
    let c = indexed_people();
    assert_eq!(
        c.store().candidates(&sel(json!({"name": "one", "age": 9}))),
        Candidates::Ids(vec![])
    );
    assert!(c
        .find(sel(json!({"name": "one", "age": 9})), FindOptions::new())
        .unwrap()
        .is_empty());
}

#[test]
fn test_uncovered_selector_scans() {
    let c = indexed_people();
    assert_eq!(
        c.store().candidates(&sel(json!({"other": 1}))),
        Candidates::All
    );
    assert_eq!(
        c.store().candidates(&sel(json!({"age": {"$gte": 2}}))),
        Candidates::All
    );
    assert_eq!(c.count(sel(json!({"age": {"$gte": 2}}))).unwrap(), 2);
}

#[test]
fn test_partial_cover_still_prunes_with_matcher_confirming() {
    let c = indexed_people();
    let selector = sel(json!({"name": "two", "age": {"$lt": 2}}));
    assert_eq!(c.store().candidates(&selector), Candidates::Ids(ids(&["3", "4"])));
    let found = c.find(selector, FindOptions::new()).unwrap();
    assert_eq!(ids_of(&found), ids(&["3"]));
}

#[test]
fn test_id_lookup_bypasses_indexes() {
    let c = indexed_people();
    assert_eq!(
        c.store().candidates(&Selector::id("3")),
        Candidates::Ids(ids(&["3"]))
    );
    assert_eq!(
        c.store().candidates(&sel(json!({"_id": {"$in": ["1", "4"]}}))),
        Candidates::Ids(ids(&["1", "4"]))
    );
}

fn counter() -> Collection {
    let mut c = collection("counter");
    c.insert_json(json!({"_id": "a", "n": 1})).unwrap();
    c
}

#[test]
fn test_repeated_ids_resolve_once() {
    let c = counter();
    let selector = sel(json!({"_id": {"$in": ["a", "a"]}}));
    assert_eq!(c.store().candidates(&selector), Candidates::Ids(ids(&["a"])));
    let found = c.find(selector, FindOptions::new()).unwrap();
    assert_eq!(ids_of(&found), ids(&["a"]));
}

#[test]
fn test_repeated_ids_update_once() {
    let mut c = counter();
    let report = c
        .update(
            sel(json!({"_id": {"$in": ["a", "a"]}})),
            &UpdateSpec::operations().inc("n", 1i64),
        )
        .unwrap();
    assert_eq!((report.matched, report.modified), (1, 1));
    assert_eq!(
        c.get(&DocId::from("a")).unwrap().get("n"),
        Some(&Value::Int(2))
    );
}

#[test]
fn test_repeated_ids_remove_once() {
    let mut c = counter();
    let removed = c.remove(sel(json!({"_id": {"$in": ["a", "a"]}}))).unwrap();
    assert_eq!(removed, 1);
    assert_eq!(c.len(), 0);
}
