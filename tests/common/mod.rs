//! Shared test utilities for all integration test suites.
//!
//! Import via `#[path = "../common/mod.rs"] mod common;` from a suite's main.rs.

#![allow(dead_code)]
#![allow(unused_imports)]

use std::sync::{Arc, Mutex, Once};

pub use minidoc::{
    ChangeEvent, Collection, DocId, Document, Error, FindOptions, LiveQueryHandle, Selector,
    SortSpec, UpdateSpec, Value,
};
pub use serde_json::json;

// ============================================================================
// Initialization
// ============================================================================

static INIT_TRACING: Once = Once::new();

/// Route `tracing` output through the test harness (shown for failing tests)
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init();
    });
}

// ============================================================================
// Builders
// ============================================================================

/// Parse a selector, panicking on malformed input
pub fn sel(json: serde_json::Value) -> Selector {
    Selector::from_json(json).expect("valid selector")
}

/// Parse a document, panicking on malformed input
pub fn doc(json: serde_json::Value) -> Document {
    Document::from_json(json).expect("valid document")
}

/// Ids from a slice of string literals
pub fn ids(values: &[&str]) -> Vec<DocId> {
    values.iter().map(|v| DocId::from(*v)).collect()
}

/// Ids of documents in order
pub fn ids_of(docs: &[Document]) -> Vec<DocId> {
    docs.iter().filter_map(Document::id).collect()
}

/// Empty collection with tracing enabled
pub fn collection(name: &str) -> Collection {
    init_tracing();
    Collection::new(name)
}

// ============================================================================
// EventLog - records change events delivered to an observer
// ============================================================================

/// Shared sink for change events
#[derive(Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<ChangeEvent>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Callback that appends every event to this log
    pub fn callback(&self) -> impl FnMut(&ChangeEvent) + Send + 'static {
        let events = Arc::clone(&self.events);
        move |event: &ChangeEvent| events.lock().unwrap().push(event.clone())
    }

    /// Copy of everything recorded so far
    pub fn events(&self) -> Vec<ChangeEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Take everything recorded so far, leaving the log empty
    pub fn take(&self) -> Vec<ChangeEvent> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Apply ordered-observer events to an id list, the way a client mirrors
/// ordered results.
pub fn replay_ordered(order: &mut Vec<DocId>, events: &[ChangeEvent]) {
    fn position(order: &[DocId], before: &Option<DocId>) -> usize {
        before
            .as_ref()
            .and_then(|b| order.iter().position(|x| x == b))
            .unwrap_or(order.len())
    }
    for event in events {
        match event {
            ChangeEvent::Added { id, before, .. } => {
                let at = position(order, before);
                order.insert(at, id.clone());
            }
            ChangeEvent::MovedBefore { id, before } => {
                order.retain(|x| x != id);
                let at = position(order, before);
                order.insert(at, id.clone());
            }
            ChangeEvent::Removed { id, .. } => order.retain(|x| x != id),
            ChangeEvent::Changed { .. } => {}
        }
    }
}
