//! Unordered live queries

use crate::common::*;

#[test]
fn test_unordered_rejects_window_and_sort() {
    let mut c = collection("people");
    for options in [
        FindOptions::new().limit(1),
        FindOptions::new().skip(1),
        FindOptions::new().sort(SortSpec::new().asc("a")),
    ] {
        assert!(matches!(
            c.observe(Selector::all(), options, false, |_| {}),
            Err(Error::InvalidQuery(_))
        ));
    }
    assert_eq!(c.live_query_count(), 0);
}

#[test]
fn test_unordered_events_have_no_position() {
    let mut c = collection("people");
    let log = EventLog::new();
    let handle = c
        .observe(sel(json!({"team": "x"})), FindOptions::new(), false, log.callback())
        .unwrap();

    c.insert_json(json!({"_id": "1", "team": "x"})).unwrap();
    c.insert_json(json!({"_id": "2", "team": "y"})).unwrap();
    c.update(sel(json!({"_id": "2"})), &UpdateSpec::operations().set("team", "x"))
        .unwrap();
    c.update(sel(json!({"_id": "1"})), &UpdateSpec::operations().set("n", 1i64))
        .unwrap();
    c.remove(sel(json!({"_id": "1"}))).unwrap();

    let events = log.events();
    assert_eq!(events.len(), 4);
    assert!(matches!(&events[0], ChangeEvent::Added { before: None, .. }));
    assert!(matches!(&events[1], ChangeEvent::Added { before: None, .. }));
    assert!(matches!(&events[2], ChangeEvent::Changed { .. }));
    assert!(matches!(&events[3], ChangeEvent::Removed { .. }));
    assert_eq!(ids_of(&c.live_results(handle).unwrap()), ids(&["2"]));
}

#[test]
fn test_failed_modifier_leaves_results_untouched() {
    let mut c = collection("people");
    c.insert_json(json!({"_id": "1", "team": "x", "name": "a"})).unwrap();
    let log = EventLog::new();
    let handle = c
        .observe(sel(json!({"team": "x"})), FindOptions::new(), false, log.callback())
        .unwrap();
    log.take();

    let report = c
        .update(sel(json!({"_id": "1"})), &UpdateSpec::operations().inc("name", 1i64))
        .unwrap();
    assert_eq!(report.failures.len(), 1);
    assert!(matches!(report.failures[0].1, Error::InvalidModifier(_)));
    assert!(log.is_empty());
    assert_eq!(
        c.live_results(handle).unwrap()[0].get("name"),
        Some(&Value::String("a".into()))
    );
}
