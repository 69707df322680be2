//! Index lookups over small, hand-built collections

use crate::common::*;
use minidoc::IndexFields;

fn fields(names: &[&str]) -> IndexFields {
    IndexFields::new(names.iter().copied()).unwrap()
}

#[test]
fn test_one_key_lookup_is_order_stable() {
    let mut c = collection("people");
    c.ensure_index(["name"]).unwrap();
    c.insert_json(json!({"_id": "1", "name": "one"})).unwrap();
    c.insert_json(json!({"_id": "2", "name": "one"})).unwrap();
    c.insert_json(json!({"_id": "3", "name": "two"})).unwrap();

    let index = c.store().index(&fields(&["name"])).unwrap();
    assert_eq!(
        index.matching_ids(&sel(json!({"name": "one"}))),
        Some(ids(&["1", "2"]))
    );
    assert_eq!(
        index.matching_ids(&sel(json!({"name": "two"}))),
        Some(ids(&["3"]))
    );
    assert_eq!(
        index.matching_ids(&sel(json!({"name": "three"}))),
        Some(vec![])
    );
}

#[test]
fn test_two_key_lookup_treats_null_as_absent() {
    let mut c = collection("people");
    c.ensure_index(["name", "age"]).unwrap();
    c.insert_json(json!({"_id": "1", "name": "Brian", "age": 3})).unwrap();
    c.insert_json(json!({"_id": "2", "name": "Brian"})).unwrap();
    c.insert_json(json!({"_id": "3", "name": "Brian", "age": null})).unwrap();

    let index = c.store().index(&fields(&["age", "name"])).unwrap();
    assert_eq!(
        index.matching_ids(&sel(json!({"name": "Brian", "age": null}))),
        Some(ids(&["3", "2"]))
    );
    assert_eq!(
        index.matching_ids(&sel(json!({"name": "Brian", "age": 3}))),
        Some(ids(&["1"]))
    );

    let found = c
        .find(sel(json!({"name": "Brian", "age": null})), FindOptions::new())
        .unwrap();
    let mut found = ids_of(&found);
    found.sort();
    assert_eq!(found, ids(&["2", "3"]));
}

#[test]
fn test_update_refiles_document() {
    let mut c = collection("people");
    c.ensure_index(["name"]).unwrap();
    c.insert_json(json!({"_id": "1", "name": "one"})).unwrap();
    c.update(sel(json!({"_id": "1"})), &UpdateSpec::operations().set("name", "uno"))
        .unwrap();

    let index = c.store().index(&fields(&["name"])).unwrap();
    assert_eq!(index.matching_ids(&sel(json!({"name": "one"}))), Some(vec![]));
    assert_eq!(
        index.matching_ids(&sel(json!({"name": "uno"}))),
        Some(ids(&["1"]))
    );
    assert_eq!(index.posting_count(), 1);
}

#[test]
fn test_update_of_unindexed_field_keeps_posting() {
    let mut c = collection("people");
    c.ensure_index(["name"]).unwrap();
    c.insert_json(json!({"_id": "1", "name": "one", "age": 1})).unwrap();
    c.insert_json(json!({"_id": "2", "name": "one", "age": 2})).unwrap();
    c.update(sel(json!({"_id": "1"})), &UpdateSpec::operations().inc("age", 10i64))
        .unwrap();

    let index = c.store().index(&fields(&["name"])).unwrap();
    assert_eq!(
        index.matching_ids(&sel(json!({"name": "one"}))),
        Some(ids(&["1", "2"]))
    );
}

#[test]
fn test_remove_drops_posting() {
    let mut c = collection("people");
    c.ensure_index(["name"]).unwrap();
    c.insert_json(json!({"_id": "1", "name": "one"})).unwrap();
    c.insert_json(json!({"_id": "2", "name": "one"})).unwrap();
    c.remove(sel(json!({"_id": "1"}))).unwrap();

    let index = c.store().index(&fields(&["name"])).unwrap();
    assert_eq!(
        index.matching_ids(&sel(json!({"name": "one"}))),
        Some(ids(&["2"]))
    );
}

#[test]
fn test_object_values_match_regardless_of_key_order() {
    let mut c = collection("places");
    c.ensure_index(["loc"]).unwrap();
    c.insert_json(json!({"_id": "1", "loc": {"x": 1, "y": 2}})).unwrap();

    let index = c.store().index(&fields(&["loc"])).unwrap();
    assert_eq!(
        index.matching_ids(&sel(json!({"loc": {"y": 2, "x": 1}}))),
        Some(ids(&["1"]))
    );
}
