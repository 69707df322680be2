//! Change events and their delivery queue
//!
//! Mutations never call observer callbacks directly. Every change to a live
//! query's results is queued as a [`ChangeEvent`] and the queue is drained
//! once the mutation has finished touching the table, indexes and result
//! sets, right before the mutating call returns.
//!
//! The diff helpers compute the events that turn one materialized result
//! set into another; they back full recomputation and resuming paused
//! observers.

use minidoc_core::{DocId, Document};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::{BTreeMap, VecDeque};

/// Identifies a registered live query
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LiveQueryHandle(u64);

impl LiveQueryHandle {
    pub(crate) fn new(id: u64) -> Self {
        LiveQueryHandle(id)
    }

    /// Numeric id, as reported in diagnostics and errors
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// One change to a live query's results
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeEvent {
    /// A document entered the results. For ordered queries `before` names
    /// the document now following it (`None` = at the end).
    Added {
        /// Document id
        id: DocId,
        /// Copy of the document
        doc: Document,
        /// Following document in ordered results
        before: Option<DocId>,
    },
    /// A document in the results changed
    Changed {
        /// Document id
        id: DocId,
        /// New contents
        doc: Document,
        /// Previous contents
        old: Document,
    },
    /// A document changed position in ordered results
    MovedBefore {
        /// Document id
        id: DocId,
        /// Document now following it (`None` = at the end)
        before: Option<DocId>,
    },
    /// A document left the results
    Removed {
        /// Document id
        id: DocId,
        /// Last contents seen by the query
        old: Document,
    },
}

impl ChangeEvent {
    /// Id of the document the event is about
    pub fn id(&self) -> &DocId {
        match self {
            ChangeEvent::Added { id, .. }
            | ChangeEvent::Changed { id, .. }
            | ChangeEvent::MovedBefore { id, .. }
            | ChangeEvent::Removed { id, .. } => id,
        }
    }
}

/// Observer callback. Runs synchronously while the collection drains its
/// queue.
pub type ObserveCallback = Box<dyn FnMut(&ChangeEvent) + Send>;

/// FIFO of events awaiting delivery
#[derive(Debug, Default)]
pub struct NotificationQueue {
    pending: VecDeque<(LiveQueryHandle, ChangeEvent)>,
}

impl NotificationQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one event
    pub fn push(&mut self, handle: LiveQueryHandle, event: ChangeEvent) {
        self.pending.push_back((handle, event));
    }

    /// Queue events for one query, keeping their order
    pub fn extend(&mut self, handle: LiveQueryHandle, events: impl IntoIterator<Item = ChangeEvent>) {
        self.pending
            .extend(events.into_iter().map(|event| (handle, event)));
    }

    /// Next event to deliver
    pub fn pop(&mut self) -> Option<(LiveQueryHandle, ChangeEvent)> {
        self.pending.pop_front()
    }

    /// Drop queued events for a query
    pub fn discard(&mut self, handle: LiveQueryHandle) {
        self.pending.retain(|(h, _)| *h != handle);
    }

    /// Number of queued events
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is queued
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Events turning `old` into `new` for ordered results.
///
/// Removals come first. Then the new order is walked front to back against
/// a working copy of the old order: unseen ids are added, ids found further
/// back are moved into place, and changed contents are reported.
pub fn diff_ordered(
    old: &[(DocId, Document)],
    new: &[(DocId, Document)],
    events: &mut Vec<ChangeEvent>,
) {
    let new_ids: FxHashSet<&DocId> = new.iter().map(|(id, _)| id).collect();
    let mut previous: FxHashMap<&DocId, &Document> = FxHashMap::default();
    let mut working: Vec<&DocId> = Vec::with_capacity(old.len());

    for (id, doc) in old {
        if new_ids.contains(id) {
            previous.insert(id, doc);
            working.push(id);
        } else {
            events.push(ChangeEvent::Removed {
                id: id.clone(),
                old: doc.clone(),
            });
        }
    }

    for (pos, (id, doc)) in new.iter().enumerate() {
        // Everything before `pos` in `working` is already final.
        let found = working[pos..]
            .iter()
            .position(|w| *w == id)
            .map(|offset| pos + offset);
        match found {
            None => {
                working.insert(pos, id);
                events.push(ChangeEvent::Added {
                    id: id.clone(),
                    doc: doc.clone(),
                    before: working.get(pos + 1).map(|next| (*next).clone()),
                });
            }
            Some(at) => {
                if let Some(old_doc) = previous.get(id) {
                    if *old_doc != doc {
                        events.push(ChangeEvent::Changed {
                            id: id.clone(),
                            doc: doc.clone(),
                            old: (*old_doc).clone(),
                        });
                    }
                }
                if at != pos {
                    working.remove(at);
                    working.insert(pos, id);
                    events.push(ChangeEvent::MovedBefore {
                        id: id.clone(),
                        before: working.get(pos + 1).map(|next| (*next).clone()),
                    });
                }
            }
        }
    }
}

/// Events turning `old` into `new` for unordered results
pub fn diff_unordered(
    old: &BTreeMap<DocId, Document>,
    new: &BTreeMap<DocId, Document>,
    events: &mut Vec<ChangeEvent>,
) {
    for (id, doc) in old {
        if !new.contains_key(id) {
            events.push(ChangeEvent::Removed {
                id: id.clone(),
                old: doc.clone(),
            });
        }
    }
    for (id, doc) in new {
        match old.get(id) {
            None => events.push(ChangeEvent::Added {
                id: id.clone(),
                doc: doc.clone(),
                before: None,
            }),
            Some(old_doc) if old_doc != doc => events.push(ChangeEvent::Changed {
                id: id.clone(),
                doc: doc.clone(),
                old: old_doc.clone(),
            }),
            Some(_) => {}
        }
    }
}
