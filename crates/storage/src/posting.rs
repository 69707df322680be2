//! Posting sets: the document ids filed under one composite key
//!
//! Ids enumerate in insertion order. Re-adding an id that is already
//! present keeps its original position; removing and re-adding moves it
//! to the end.

use minidoc_core::DocId;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

/// Insertion-ordered set of document ids
#[derive(Debug, Default, Clone)]
pub struct PostingSet {
    /// Next insertion sequence number
    next_seq: u64,
    /// seq -> id, iterated for stable ordering
    order: BTreeMap<u64, DocId>,
    /// id -> seq, for O(1) membership and O(log n) removal
    slots: FxHashMap<DocId, u64>,
}

impl PostingSet {
    /// Create an empty posting set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an id. Returns false if it was already present.
    pub fn add(&mut self, id: DocId) -> bool {
        if self.slots.contains_key(&id) {
            return false;
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.order.insert(seq, id.clone());
        self.slots.insert(id, seq);
        true
    }

    /// Remove an id. Returns false if it was absent.
    pub fn remove(&mut self, id: &DocId) -> bool {
        match self.slots.remove(id) {
            Some(seq) => {
                self.order.remove(&seq);
                true
            }
            None => false,
        }
    }

    /// Membership test
    pub fn contains(&self, id: &DocId) -> bool {
        self.slots.contains_key(id)
    }

    /// Iterate ids in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &DocId> {
        self.order.values()
    }

    /// Snapshot of the ids in insertion order
    pub fn values(&self) -> Vec<DocId> {
        self.order.values().cloned().collect()
    }

    /// Number of ids
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the set holds no ids
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
