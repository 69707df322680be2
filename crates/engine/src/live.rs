//! Live queries and the coordinator that keeps them current
//!
//! Every registered [`LiveQuery`] holds a materialized result set. The
//! coordinator receives a hook for each document a mutation touches and
//! reconciles every live query:
//!
//! - Unwindowed queries are patched in place: insert, remove, or replace
//!   (re-positioned when sorted).
//! - Windowed queries (skip or limit) cannot be patched locally, since one
//!   document entering the match set shifts the window. They are marked in
//!   a [`RecomputeSet`] and re-run once after the whole batch has reached
//!   the document table.
//!
//! Result changes become [`ChangeEvent`]s on the notification queue. While
//! observers are paused the results keep being maintained but nothing is
//! queued; resuming diffs each query against its snapshot from the pause.

use crate::observe::{
    diff_ordered, diff_unordered, ChangeEvent, LiveQueryHandle, NotificationQueue,
    ObserveCallback,
};
use crate::query::Query;
use minidoc_core::{Comparator, DistanceMap, DocId, Document, Error, Result};
use minidoc_storage::DocumentStore;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Materialized results of a live query
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResults {
    /// Sequence in result order
    Ordered(Vec<(DocId, Document)>),
    /// Mapping keyed by id
    Unordered(BTreeMap<DocId, Document>),
}

impl QueryResults {
    fn empty_like(&self) -> Self {
        match self {
            QueryResults::Ordered(_) => QueryResults::Ordered(Vec::new()),
            QueryResults::Unordered(_) => QueryResults::Unordered(BTreeMap::new()),
        }
    }

    /// Number of documents
    pub fn len(&self) -> usize {
        match self {
            QueryResults::Ordered(list) => list.len(),
            QueryResults::Unordered(map) => map.len(),
        }
    }

    /// Whether there are no documents
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a document is in the results
    pub fn contains(&self, id: &DocId) -> bool {
        match self {
            QueryResults::Ordered(list) => list.iter().any(|(i, _)| i == id),
            QueryResults::Unordered(map) => map.contains_key(id),
        }
    }

    /// Copies of the documents, in result order (id order when unordered)
    pub fn documents(&self) -> Vec<Document> {
        match self {
            QueryResults::Ordered(list) => list.iter().map(|(_, d)| d.clone()).collect(),
            QueryResults::Unordered(map) => map.values().cloned().collect(),
        }
    }

    /// Ids in result order (id order when unordered)
    pub fn ids(&self) -> Vec<DocId> {
        match self {
            QueryResults::Ordered(list) => list.iter().map(|(id, _)| id.clone()).collect(),
            QueryResults::Unordered(map) => map.keys().cloned().collect(),
        }
    }

    fn initial_events(&self) -> Vec<ChangeEvent> {
        let added = |(id, doc): (&DocId, &Document)| ChangeEvent::Added {
            id: id.clone(),
            doc: doc.clone(),
            before: None,
        };
        match self {
            QueryResults::Ordered(list) => list.iter().map(|(id, doc)| added((id, doc))).collect(),
            QueryResults::Unordered(map) => map.iter().map(added).collect(),
        }
    }
}

/// Events turning `old` into `new`; both must be the same kind
fn diff_results(old: &QueryResults, new: &QueryResults, events: &mut Vec<ChangeEvent>) {
    match (old, new) {
        (QueryResults::Ordered(a), QueryResults::Ordered(b)) => diff_ordered(a, b, events),
        (QueryResults::Unordered(a), QueryResults::Unordered(b)) => diff_unordered(a, b, events),
        _ => {}
    }
}

/// Upper-bound position for `doc` in a sorted list
fn insertion_point(list: &[(DocId, Document)], doc: &Document, cmp: &Comparator<'_>) -> usize {
    list.partition_point(|(_, existing)| cmp(existing, doc) != Ordering::Greater)
}

/// A registered query with its current results
pub struct LiveQuery {
    query: Query,
    results: QueryResults,
    distances: Option<DistanceMap>,
    snapshot: Option<QueryResults>,
    callback: ObserveCallback,
    recomputations: u64,
}

impl LiveQuery {
    /// The query being observed
    pub fn query(&self) -> &Query {
        &self.query
    }

    /// Current results
    pub fn results(&self) -> &QueryResults {
        &self.results
    }

    /// Whether this query is ordered
    pub fn is_ordered(&self) -> bool {
        matches!(self.results, QueryResults::Ordered(_))
    }

    /// How many full recomputations this query has gone through
    pub fn recomputations(&self) -> u64 {
        self.recomputations
    }

    fn record_distance(&mut self, id: &DocId, distance: Option<f64>) {
        if let (Some(map), Some(d)) = (self.distances.as_mut(), distance) {
            map.insert(id.clone(), d);
        }
    }

    fn insert_result(&mut self, id: DocId, doc: Document, events: &mut Vec<ChangeEvent>) {
        match &mut self.results {
            QueryResults::Unordered(map) => {
                map.insert(id.clone(), doc.clone());
                events.push(ChangeEvent::Added {
                    id,
                    doc,
                    before: None,
                });
            }
            QueryResults::Ordered(list) => {
                let pos = match self.query.sorter() {
                    Some(sorter) => {
                        let cmp = sorter.comparator(self.distances.as_ref());
                        insertion_point(list, &doc, &cmp)
                    }
                    None => list.len(),
                };
                list.insert(pos, (id.clone(), doc.clone()));
                let before = list.get(pos + 1).map(|(next, _)| next.clone());
                events.push(ChangeEvent::Added { id, doc, before });
            }
        }
    }

    fn remove_result(&mut self, id: &DocId, events: &mut Vec<ChangeEvent>) {
        let removed = match &mut self.results {
            QueryResults::Unordered(map) => map.remove(id),
            QueryResults::Ordered(list) => list
                .iter()
                .position(|(i, _)| i == id)
                .map(|pos| list.remove(pos).1),
        };
        if let Some(map) = self.distances.as_mut() {
            map.remove(id);
        }
        if let Some(old) = removed {
            events.push(ChangeEvent::Removed {
                id: id.clone(),
                old,
            });
        }
    }

    fn update_result(&mut self, id: &DocId, doc: &Document, old: &Document, events: &mut Vec<ChangeEvent>) {
        match &mut self.results {
            QueryResults::Unordered(map) => {
                map.insert(id.clone(), doc.clone());
                events.push(ChangeEvent::Changed {
                    id: id.clone(),
                    doc: doc.clone(),
                    old: old.clone(),
                });
            }
            QueryResults::Ordered(list) => {
                let Some(pos) = list.iter().position(|(i, _)| i == id) else {
                    return;
                };
                list[pos].1 = doc.clone();
                events.push(ChangeEvent::Changed {
                    id: id.clone(),
                    doc: doc.clone(),
                    old: old.clone(),
                });

                let Some(sorter) = self.query.sorter() else {
                    return;
                };
                let cmp = sorter.comparator(self.distances.as_ref());
                let after_prev = pos == 0 || cmp(&list[pos - 1].1, doc) != Ordering::Greater;
                let before_next =
                    pos + 1 >= list.len() || cmp(doc, &list[pos + 1].1) != Ordering::Greater;
                if after_prev && before_next {
                    return;
                }
                let entry = list.remove(pos);
                let new_pos = insertion_point(list, &entry.1, &cmp);
                list.insert(new_pos, entry);
                let before = list.get(new_pos + 1).map(|(next, _)| next.clone());
                events.push(ChangeEvent::MovedBefore {
                    id: id.clone(),
                    before,
                });
            }
        }
    }

    fn recompute(&mut self, store: &DocumentStore, events: &mut Vec<ChangeEvent>) {
        let output = self.query.run(store);
        let fresh = match self.results {
            QueryResults::Ordered(_) => QueryResults::Ordered(output.docs),
            QueryResults::Unordered(_) => {
                QueryResults::Unordered(output.docs.into_iter().collect())
            }
        };
        diff_results(&self.results, &fresh, events);
        self.results = fresh;
        self.distances = output.distances;
        self.recomputations += 1;
    }
}

/// Deduplicating set of live queries awaiting full recomputation.
///
/// Threaded through one batch mutation and drained once at its end.
#[derive(Debug, Default)]
pub struct RecomputeSet {
    pending: BTreeSet<LiveQueryHandle>,
}

impl RecomputeSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a query; returns false if it was already marked
    pub fn mark(&mut self, handle: LiveQueryHandle) -> bool {
        self.pending.insert(handle)
    }

    /// Whether a query is marked
    pub fn contains(&self, handle: LiveQueryHandle) -> bool {
        self.pending.contains(&handle)
    }

    /// Number of marked queries
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is marked
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Match state of every live query for a document about to be modified
#[derive(Debug, Default)]
pub struct MatchedBefore {
    matched: BTreeMap<LiveQueryHandle, bool>,
}

/// Registry of live queries plus the pending notifications
#[derive(Default)]
pub struct LiveQueryCoordinator {
    queries: BTreeMap<LiveQueryHandle, LiveQuery>,
    next_id: u64,
    queue: NotificationQueue,
    paused: bool,
}

impl LiveQueryCoordinator {
    /// Create an empty coordinator
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Register a live query and queue its initial results as `Added`.
    ///
    /// # Arguments
    /// * `query` - Query to keep current
    /// * `ordered` - Keep results as a sequence (with positions) or a mapping
    /// * `callback` - Receives every change once the queue drains
    /// * `store` - Table to run the initial query against
    ///
    /// # Errors
    /// `InvalidQuery` when an unordered query carries skip, limit or sort.
    pub fn register(
        &mut self,
        query: Query,
        ordered: bool,
        callback: ObserveCallback,
        store: &DocumentStore,
    ) -> Result<LiveQueryHandle> {
        if !ordered && (query.is_windowed() || query.is_sorted()) {
            return Err(Error::invalid_query(
                "unordered live queries cannot use skip, limit or sort",
            ));
        }

        let output = query.run(store);
        let results = if ordered {
            QueryResults::Ordered(output.docs)
        } else {
            QueryResults::Unordered(output.docs.into_iter().collect())
        };

        self.next_id += 1;
        let handle = LiveQueryHandle::new(self.next_id);
        // A query registered while paused reports everything on resume.
        let snapshot = self.paused.then(|| results.empty_like());
        if !self.paused {
            self.queue.extend(handle, results.initial_events());
        }

        debug!(
            target: "minidoc::live",
            query = handle.id(),
            ordered,
            results = results.len(),
            "Live query registered"
        );

        self.queries.insert(
            handle,
            LiveQuery {
                query,
                results,
                distances: output.distances,
                snapshot,
                callback,
                recomputations: 0,
            },
        );
        Ok(handle)
    }

    /// Deregister a live query, dropping its undelivered events
    pub fn stop(&mut self, handle: LiveQueryHandle) -> bool {
        self.queue.discard(handle);
        let stopped = self.queries.remove(&handle).is_some();
        if stopped {
            debug!(target: "minidoc::live", query = handle.id(), "Live query stopped");
        }
        stopped
    }

    /// A registered live query
    pub fn get(&self, handle: LiveQueryHandle) -> Result<&LiveQuery> {
        self.queries
            .get(&handle)
            .ok_or(Error::UnknownLiveQuery(handle.id()))
    }

    /// Number of registered live queries
    pub fn len(&self) -> usize {
        self.queries.len()
    }

    /// Whether no live query is registered
    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    // ========================================================================
    // Mutation hooks
    // ========================================================================

    /// A document was inserted into the table
    pub fn document_inserted(&mut self, id: &DocId, doc: &Document, recompute: &mut RecomputeSet) {
        for (handle, live) in self.queries.iter_mut() {
            let m = live.query.matches(doc);
            if !m.matched {
                continue;
            }
            live.record_distance(id, m.distance);
            if live.query.is_windowed() {
                recompute.mark(*handle);
            } else {
                let mut events = Vec::new();
                live.insert_result(id.clone(), doc.clone(), &mut events);
                if !self.paused {
                    self.queue.extend(*handle, events);
                }
            }
        }
    }

    /// A document is about to leave the table.
    ///
    /// Marks windowed queries for recomputation and returns the unwindowed
    /// ones to patch with [`Self::document_removed`] once the table no
    /// longer holds the document.
    pub fn document_removing(
        &self,
        doc: &Document,
        recompute: &mut RecomputeSet,
    ) -> Vec<LiveQueryHandle> {
        let mut direct = Vec::new();
        for (handle, live) in &self.queries {
            if !live.query.matches(doc).matched {
                continue;
            }
            if live.query.is_windowed() {
                recompute.mark(*handle);
            } else {
                direct.push(*handle);
            }
        }
        direct
    }

    /// Drop a removed document from the given queries' results
    pub fn document_removed(&mut self, id: &DocId, handles: &[LiveQueryHandle]) {
        for handle in handles {
            let Some(live) = self.queries.get_mut(handle) else {
                continue;
            };
            let mut events = Vec::new();
            live.remove_result(id, &mut events);
            if !self.paused {
                self.queue.extend(*handle, events);
            }
        }
    }

    /// Record whether each live query matches a document before it changes.
    ///
    /// Unordered queries answer from result membership.
    pub fn matched_before(&self, id: &DocId, doc: &Document) -> MatchedBefore {
        let matched = self
            .queries
            .iter()
            .map(|(handle, live)| {
                let before = if live.is_ordered() {
                    live.query.matches(doc).matched
                } else {
                    live.results.contains(id)
                };
                (*handle, before)
            })
            .collect();
        MatchedBefore { matched }
    }

    /// A document was modified in place
    pub fn document_updated(
        &mut self,
        id: &DocId,
        doc: &Document,
        old: &Document,
        before: &MatchedBefore,
        recompute: &mut RecomputeSet,
    ) {
        for (handle, live) in self.queries.iter_mut() {
            let Some(&was) = before.matched.get(handle) else {
                continue;
            };
            let m = live.query.matches(doc);
            let is = m.matched;
            if is {
                live.record_distance(id, m.distance);
            }

            if live.query.is_windowed() {
                if was || is {
                    recompute.mark(*handle);
                }
                continue;
            }

            let mut events = Vec::new();
            match (was, is) {
                (true, false) => live.remove_result(id, &mut events),
                (false, true) => live.insert_result(id.clone(), doc.clone(), &mut events),
                (true, true) => live.update_result(id, doc, old, &mut events),
                (false, false) => {}
            }
            if !self.paused {
                self.queue.extend(*handle, events);
            }
        }
    }

    /// Re-run every marked query and queue the differences
    pub fn recompute(&mut self, set: RecomputeSet, store: &DocumentStore) {
        for handle in set.pending {
            let Some(live) = self.queries.get_mut(&handle) else {
                continue;
            };
            let mut events = Vec::new();
            live.recompute(store, &mut events);
            debug!(
                target: "minidoc::live",
                query = handle.id(),
                results = live.results.len(),
                changes = events.len(),
                "Live query recomputed"
            );
            if !self.paused {
                self.queue.extend(handle, events);
            }
        }
    }

    /// Empty every query's results without queuing events.
    ///
    /// Only valid while paused; resuming reports the removals.
    pub fn reset_all(&mut self) {
        for live in self.queries.values_mut() {
            live.results = live.results.empty_like();
            if let Some(map) = live.distances.as_mut() {
                map.clear();
            }
        }
    }

    // ========================================================================
    // Pause / resume
    // ========================================================================

    /// Whether notifications are paused
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Stop queuing events and snapshot every query's results
    pub fn pause(&mut self) {
        if self.paused {
            return;
        }
        self.paused = true;
        for live in self.queries.values_mut() {
            live.snapshot = Some(live.results.clone());
        }
    }

    /// Queue the difference between each snapshot and the current results
    pub fn resume(&mut self) {
        if !self.paused {
            return;
        }
        self.paused = false;
        for (handle, live) in self.queries.iter_mut() {
            let Some(snapshot) = live.snapshot.take() else {
                continue;
            };
            let mut events = Vec::new();
            diff_results(&snapshot, &live.results, &mut events);
            self.queue.extend(*handle, events);
        }
    }

    // ========================================================================
    // Delivery
    // ========================================================================

    /// Number of events waiting for delivery
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Deliver every queued event to its callback, in order
    pub fn flush(&mut self) -> usize {
        let mut delivered = 0;
        while let Some((handle, event)) = self.queue.pop() {
            if let Some(live) = self.queries.get_mut(&handle) {
                (live.callback)(&event);
                delivered += 1;
            }
        }
        delivered
    }
}
