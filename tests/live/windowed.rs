//! Windowed (skip/limit) live queries are recomputed, never patched

use crate::common::*;

fn five_scores() -> Collection {
    let mut c = collection("scores");
    for (id, score) in [("a", 1), ("b", 2), ("c", 3), ("d", 4), ("e", 5)] {
        c.insert_json(json!({"_id": id, "score": score, "kind": "in"}))
            .unwrap();
    }
    c.insert_json(json!({"_id": "f", "score": 0, "kind": "out"}))
        .unwrap();
    c
}

#[test]
fn test_update_entering_window_recomputes_once() {
    let mut c = five_scores();
    let window = EventLog::new();
    let plain = EventLog::new();

    let windowed = c
        .observe(
            sel(json!({"kind": "in"})),
            FindOptions::new()
                .sort(SortSpec::new().asc("score"))
                .skip(1)
                .limit(2),
            true,
            window.callback(),
        )
        .unwrap();
    let unwindowed = c
        .observe(sel(json!({"kind": "in"})), FindOptions::new(), true, plain.callback())
        .unwrap();
    assert_eq!(ids_of(&c.live_results(windowed).unwrap()), ids(&["b", "c"]));
    window.take();
    plain.take();

    c.update(sel(json!({"_id": "f"})), &UpdateSpec::operations().set("kind", "in"))
        .unwrap();

    assert_eq!(c.recomputations(windowed).unwrap(), 1);
    assert_eq!(c.recomputations(unwindowed).unwrap(), 0);
    assert_eq!(ids_of(&c.live_results(windowed).unwrap()), ids(&["a", "b"]));

    let mut order = ids(&["b", "c"]);
    replay_ordered(&mut order, &window.events());
    assert_eq!(order, ids(&["a", "b"]));

    let plain_events = plain.events();
    assert_eq!(plain_events.len(), 1);
    assert!(matches!(&plain_events[0], ChangeEvent::Added { id, .. } if id.as_str() == "f"));
}

#[test]
fn test_unrelated_document_triggers_no_recompute() {
    let mut c = five_scores();
    let log = EventLog::new();
    let handle = c
        .observe(
            sel(json!({"kind": "in"})),
            FindOptions::new().limit(2),
            true,
            log.callback(),
        )
        .unwrap();
    log.take();

    c.insert_json(json!({"_id": "g", "kind": "out"})).unwrap();
    c.update(sel(json!({"_id": "f"})), &UpdateSpec::operations().set("score", 9i64))
        .unwrap();
    c.remove(sel(json!({"kind": "out"}))).unwrap();

    assert_eq!(c.recomputations(handle).unwrap(), 0);
    assert!(log.is_empty());
}

#[test]
fn test_batch_remove_recomputes_once() {
    let mut c = five_scores();
    let log = EventLog::new();
    let handle = c
        .observe(
            sel(json!({"kind": "in"})),
            FindOptions::new().sort(SortSpec::new().desc("score")).limit(3),
            true,
            log.callback(),
        )
        .unwrap();
    assert_eq!(ids_of(&c.live_results(handle).unwrap()), ids(&["e", "d", "c"]));
    log.take();

    assert_eq!(c.remove(sel(json!({"score": {"$gte": 4}}))).unwrap(), 2);

    assert_eq!(c.recomputations(handle).unwrap(), 1);
    assert_eq!(ids_of(&c.live_results(handle).unwrap()), ids(&["c", "b", "a"]));

    let mut order = ids(&["e", "d", "c"]);
    replay_ordered(&mut order, &log.events());
    assert_eq!(order, ids(&["c", "b", "a"]));
}

#[test]
fn test_insert_into_window_shifts_results() {
    let mut c = five_scores();
    let log = EventLog::new();
    let handle = c
        .observe(
            sel(json!({"kind": "in"})),
            FindOptions::new().sort(SortSpec::new().asc("score")).limit(2),
            true,
            log.callback(),
        )
        .unwrap();
    log.take();

    c.insert_json(json!({"_id": "z", "score": -1, "kind": "in"}))
        .unwrap();

    assert_eq!(ids_of(&c.live_results(handle).unwrap()), ids(&["z", "a"]));
    let events = log.events();
    assert!(events
        .iter()
        .any(|e| matches!(e, ChangeEvent::Removed { id, .. } if id.as_str() == "b")));
    assert!(events
        .iter()
        .any(|e| matches!(e, ChangeEvent::Added { id, before: Some(b), .. }
            if id.as_str() == "z" && b.as_str() == "a")));
}

#[test]
fn test_live_results_match_fresh_find() {
    let mut c = five_scores();
    let options = FindOptions::new()
        .sort(SortSpec::new().desc("score"))
        .skip(1)
        .limit(3);
    let handle = c
        .observe(sel(json!({"kind": "in"})), options.clone(), true, |_| {})
        .unwrap();

    c.update(sel(json!({"_id": "a"})), &UpdateSpec::operations().set("score", 10i64))
        .unwrap();
    c.remove(sel(json!({"_id": "c"}))).unwrap();
    c.insert_json(json!({"_id": "h", "score": 3.5, "kind": "in"}))
        .unwrap();

    let fresh = c.find(sel(json!({"kind": "in"})), options).unwrap();
    assert_eq!(c.live_results(handle).unwrap(), fresh);
}
