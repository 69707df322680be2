//! Paused observers and the remove-everything fast path

use crate::common::*;

fn seeded() -> (Collection, EventLog, LiveQueryHandle) {
    let mut c = collection("people");
    c.insert_json(json!({"_id": "1", "n": 1})).unwrap();
    c.insert_json(json!({"_id": "2", "n": 2})).unwrap();
    let log = EventLog::new();
    let handle = c
        .observe(
            Selector::all(),
            FindOptions::new().sort(SortSpec::new().asc("n")),
            true,
            log.callback(),
        )
        .unwrap();
    log.take();
    (c, log, handle)
}

#[test]
fn test_paused_changes_arrive_as_one_diff() {
    let (mut c, log, handle) = seeded();
    c.pause_observers();

    c.insert_json(json!({"_id": "3", "n": 0})).unwrap();
    c.update(sel(json!({"_id": "1"})), &UpdateSpec::operations().set("n", 5i64))
        .unwrap();
    c.remove(sel(json!({"_id": "2"}))).unwrap();
    assert!(log.is_empty());
    assert_eq!(ids_of(&c.live_results(handle).unwrap()), ids(&["3", "1"]));

    c.resume_observers();
    let mut order = ids(&["1", "2"]);
    replay_ordered(&mut order, &log.events());
    assert_eq!(order, ids(&["3", "1"]));
}

#[test]
fn test_fast_clear_resets_results() {
    let (mut c, log, handle) = seeded();
    c.pause_observers();
    assert_eq!(c.remove(Selector::all()).unwrap(), 2);
    assert!(c.is_empty());
    assert!(c.live_results(handle).unwrap().is_empty());

    c.resume_observers();
    let events = log.events();
    assert_eq!(events.len(), 2);
    assert!(events
        .iter()
        .all(|e| matches!(e, ChangeEvent::Removed { .. })));
}

#[test]
fn test_fast_clear_skipped_while_saving_originals() {
    let (mut c, _log, _handle) = seeded();
    c.pause_observers();
    c.save_originals().unwrap();
    assert_eq!(c.remove(Selector::all()).unwrap(), 2);
    let originals = c.retrieve_originals().unwrap();
    assert_eq!(originals.len(), 2);
    assert!(originals.values().all(Option::is_some));
}

#[test]
fn test_observe_while_paused_reports_on_resume() {
    let mut c = collection("people");
    c.insert_json(json!({"_id": "1"})).unwrap();
    c.pause_observers();
    let log = EventLog::new();
    c.observe(Selector::all(), FindOptions::new(), true, log.callback())
        .unwrap();
    assert!(log.is_empty());

    c.resume_observers();
    let events = log.events();
    assert_eq!(events.len(), 1);
    assert!(matches!(&events[0], ChangeEvent::Added { id, .. } if id.as_str() == "1"));
}

#[test]
fn test_fast_clear_disabled_by_config() {
    let config = minidoc::CollectionConfig {
        fast_clear: false,
        ..minidoc::CollectionConfig::named("people")
    };
    let mut c = Collection::with_config(config).unwrap();
    c.insert_json(json!({"_id": "1"})).unwrap();
    c.pause_observers();
    assert_eq!(c.remove(Selector::all()).unwrap(), 1);
    c.resume_observers();
    assert!(c.is_empty());
}
