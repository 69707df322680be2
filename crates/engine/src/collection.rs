//! Collection facade
//!
//! [`Collection`] owns the document table, its indexes, and the live-query
//! coordinator, and runs every mutation through all three:
//!
//! 1. the document table and indexes change
//! 2. each affected live query is patched, or marked for recomputation
//! 3. marked queries are recomputed once the whole batch is in the table
//! 4. queued change events are delivered, before the call returns
//!
//! Reads return copies. Mutations take `&mut self`, so a mutation and the
//! delivery of its events finish before any other call on the collection.

use crate::config::CollectionConfig;
use crate::id::UuidGenerator;
use crate::live::{LiveQueryCoordinator, RecomputeSet};
use crate::matcher::SelectorMatcher;
use crate::observe::{ChangeEvent, LiveQueryHandle, ObserveCallback};
use crate::query::{FindOptions, Query};
use minidoc_core::{
    DocId, Document, Error, IdGenerator, Matcher, Modifier, Result, Selector,
};
use minidoc_storage::{DocumentStore, IndexDeclaration, IndexFields};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Pre-mutation state of every touched document; `None` for inserts
pub type Originals = BTreeMap<DocId, Option<Document>>;

/// Outcome of `update` / `update_one`
#[derive(Debug, Default)]
pub struct UpdateReport {
    /// Documents the selector matched
    pub matched: usize,
    /// Documents whose contents changed
    pub modified: usize,
    /// Documents the modifier could not be applied to
    pub failures: Vec<(DocId, Error)>,
}

impl UpdateReport {
    /// Whether every matched document was updated without error
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Document collection with secondary indexes and live queries
pub struct Collection {
    config: CollectionConfig,
    store: DocumentStore,
    live: LiveQueryCoordinator,
    ids: Box<dyn IdGenerator>,
    originals: Option<Originals>,
}

impl Collection {
    /// Empty collection with default settings
    pub fn new(name: impl Into<String>) -> Self {
        Self::empty(CollectionConfig::named(name))
    }

    /// Open a collection from config, declaring its indexes.
    ///
    /// # Errors
    ///
    /// Returns an error if the config is invalid; nothing is created.
    pub fn with_config(config: CollectionConfig) -> Result<Self> {
        config.validate()?;
        let declared = config.index_fields()?;
        let mut collection = Self::empty(config);
        for fields in declared {
            collection.store.ensure_index(fields.as_slice().iter().cloned())?;
        }
        Ok(collection)
    }

    fn empty(config: CollectionConfig) -> Self {
        Self {
            config,
            store: DocumentStore::new(),
            live: LiveQueryCoordinator::new(),
            ids: Box::new(UuidGenerator),
            originals: None,
        }
    }

    /// Use a different generator for documents inserted without `_id`
    pub fn with_id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Box::new(ids);
        self
    }

    /// Collection name
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Active configuration
    pub fn config(&self) -> &CollectionConfig {
        &self.config
    }

    /// Read access to the table and indexes
    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    /// Number of stored documents
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Whether the collection holds no documents
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    // ========================================================================
    // Indexes
    // ========================================================================

    /// Declare an index over top-level fields; a repeat declaration is a no-op
    pub fn ensure_index<I, S>(&mut self, fields: I) -> Result<IndexDeclaration>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.store.ensure_index(fields)
    }

    /// Drop the index over these fields. Returns false if none existed.
    pub fn drop_index<I, S>(&mut self, fields: I) -> Result<bool>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields = IndexFields::new(fields)?;
        Ok(self.store.drop_index(&fields))
    }

    /// Declared indexes
    pub fn indexes(&self) -> Vec<IndexFields> {
        self.store.indexes().cloned().collect()
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Insert a document, generating `_id` when absent. Returns the id.
    ///
    /// # Errors
    ///
    /// `InvalidId` for a non-string `_id`, `DuplicateId` when the id is taken.
    pub fn insert(&mut self, mut doc: Document) -> Result<DocId> {
        let id = match doc.checked_id()? {
            Some(id) => id,
            None => {
                let id = self.ids.next_id();
                doc.set_id(id.clone());
                id
            }
        };
        self.store.insert(doc.clone())?;
        self.save_original(&id, None);

        let mut recompute = RecomputeSet::new();
        self.live.document_inserted(&id, &doc, &mut recompute);
        self.live.recompute(recompute, &self.store);
        self.live.flush();

        debug!(target: "minidoc::store", collection = %self.config.name, id = %id, "Document inserted");
        Ok(id)
    }

    /// Insert a document given as a JSON object
    pub fn insert_json(&mut self, json: serde_json::Value) -> Result<DocId> {
        self.insert(Document::from_json(json)?)
    }

    /// Remove every document matching the selector. Returns the count.
    ///
    /// # Errors
    ///
    /// `InvalidSelector` for a selector the default matcher cannot evaluate.
    pub fn remove(&mut self, selector: Selector) -> Result<usize> {
        if selector.is_empty() && self.can_fast_clear() {
            let removed = self.store.clear();
            self.live.reset_all();
            debug!(
                target: "minidoc::store",
                collection = %self.config.name,
                removed,
                "Collection cleared"
            );
            return Ok(removed);
        }
        let matcher = SelectorMatcher::new(selector)?;
        Ok(self.remove_matching(&matcher))
    }

    /// Remove every document a caller-supplied matcher confirms
    pub fn remove_matching(&mut self, matcher: &dyn Matcher) -> usize {
        let ids = self.confirmed_ids(matcher, usize::MAX);

        let mut recompute = RecomputeSet::new();
        let mut direct = Vec::with_capacity(ids.len());
        for id in &ids {
            let Some(doc) = self.store.remove(id) else {
                continue;
            };
            let handles = self.live.document_removing(&doc, &mut recompute);
            self.save_original(id, Some(doc));
            direct.push((id, handles));
        }
        let removed = direct.len();
        // Live results only change once the whole batch has left the table.
        for (id, handles) in direct {
            self.live.document_removed(id, &handles);
        }
        self.live.recompute(recompute, &self.store);
        self.live.flush();

        debug!(
            target: "minidoc::store",
            collection = %self.config.name,
            removed,
            "Documents removed"
        );
        removed
    }

    fn can_fast_clear(&self) -> bool {
        self.config.fast_clear && self.live.is_paused() && self.originals.is_none()
    }

    /// Apply a modifier to every document matching the selector
    pub fn update(&mut self, selector: Selector, modifier: &dyn Modifier) -> Result<UpdateReport> {
        let matcher = SelectorMatcher::new(selector)?;
        Ok(self.update_matching(&matcher, modifier, usize::MAX))
    }

    /// Apply a modifier to the first document matching the selector
    pub fn update_one(&mut self, selector: Selector, modifier: &dyn Modifier) -> Result<UpdateReport> {
        let matcher = SelectorMatcher::new(selector)?;
        Ok(self.update_matching(&matcher, modifier, 1))
    }

    /// Apply a modifier to up to `max` documents a caller-supplied matcher
    /// confirms.
    ///
    /// Failures are per document: a document the modifier rejects keeps its
    /// previous contents and the batch continues.
    pub fn update_matching(
        &mut self,
        matcher: &dyn Matcher,
        modifier: &dyn Modifier,
        max: usize,
    ) -> UpdateReport {
        let ids = self.confirmed_ids(matcher, max);
        let mut report = UpdateReport::default();
        let mut recompute = RecomputeSet::new();

        for id in ids {
            let Some(old) = self.store.get(&id).cloned() else {
                continue;
            };
            report.matched += 1;

            let mut new = old.clone();
            if let Err(e) = modifier.apply(&mut new) {
                warn!(target: "minidoc::store", id = %id, error = %e, "Modifier failed");
                report.failures.push((id, e));
                continue;
            }
            if new == old {
                continue;
            }

            let before = self.live.matched_before(&id, &old);
            if let Err(e) = self.store.replace(&id, new.clone()) {
                warn!(target: "minidoc::store", id = %id, error = %e, "Update rejected");
                report.failures.push((id, e));
                continue;
            }
            self.save_original(&id, Some(old.clone()));
            self.live
                .document_updated(&id, &new, &old, &before, &mut recompute);
            report.modified += 1;
        }

        self.live.recompute(recompute, &self.store);
        self.live.flush();

        debug!(
            target: "minidoc::store",
            collection = %self.config.name,
            matched = report.matched,
            modified = report.modified,
            failed = report.failures.len(),
            "Documents updated"
        );
        report
    }

    fn confirmed_ids(&self, matcher: &dyn Matcher, max: usize) -> Vec<DocId> {
        self.store
            .possibly_matching(matcher.selector())
            .filter(|(_, doc)| matcher.document_matches(doc).matched)
            .map(|(id, _)| id.clone())
            .take(max)
            .collect()
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Copy of one document
    pub fn get(&self, id: &DocId) -> Option<Document> {
        self.store.get(id).cloned()
    }

    /// Matching documents, sorted and windowed per the options
    pub fn find(&self, selector: Selector, options: FindOptions) -> Result<Vec<Document>> {
        Ok(self.find_query(&Query::new(selector, options)?))
    }

    /// Run a prepared query
    pub fn find_query(&self, query: &Query) -> Vec<Document> {
        query.run(&self.store).docs.into_iter().map(|(_, doc)| doc).collect()
    }

    /// First matching document in result order
    pub fn find_one(&self, selector: Selector, options: FindOptions) -> Result<Option<Document>> {
        let query = Query::new(selector, options)?.limit(1);
        Ok(self.find_query(&query).into_iter().next())
    }

    /// Number of matching documents
    pub fn count(&self, selector: Selector) -> Result<usize> {
        let query = Query::new(selector, FindOptions::new())?;
        Ok(query.run(&self.store).docs.len())
    }

    // ========================================================================
    // Live queries
    // ========================================================================

    /// Observe a selector. Initial results are delivered as `Added` before
    /// this returns.
    pub fn observe<F>(
        &mut self,
        selector: Selector,
        options: FindOptions,
        ordered: bool,
        callback: F,
    ) -> Result<LiveQueryHandle>
    where
        F: FnMut(&ChangeEvent) + Send + 'static,
    {
        let query = Query::new(selector, options)?;
        self.observe_query(query, ordered, Box::new(callback))
    }

    /// Observe a prepared query
    pub fn observe_query(
        &mut self,
        query: Query,
        ordered: bool,
        callback: ObserveCallback,
    ) -> Result<LiveQueryHandle> {
        let handle = self.live.register(query, ordered, callback, &self.store)?;
        self.live.flush();
        Ok(handle)
    }

    /// Stop a live query. Returns false if it was not registered.
    pub fn stop(&mut self, handle: LiveQueryHandle) -> bool {
        self.live.stop(handle)
    }

    /// Copy of a live query's current results
    pub fn live_results(&self, handle: LiveQueryHandle) -> Result<Vec<Document>> {
        Ok(self.live.get(handle)?.results().documents())
    }

    /// How many times a live query was fully recomputed
    pub fn recomputations(&self, handle: LiveQueryHandle) -> Result<u64> {
        Ok(self.live.get(handle)?.recomputations())
    }

    /// Number of registered live queries
    pub fn live_query_count(&self) -> usize {
        self.live.len()
    }

    /// Stop delivering events; results keep being maintained
    pub fn pause_observers(&mut self) {
        self.live.pause();
    }

    /// Deliver everything that changed since `pause_observers`
    pub fn resume_observers(&mut self) {
        self.live.resume();
        self.live.flush();
    }

    // ========================================================================
    // Saved originals
    // ========================================================================

    /// Start recording the pre-mutation state of touched documents.
    ///
    /// # Errors
    ///
    /// `InvalidOperation` if originals are already being saved.
    pub fn save_originals(&mut self) -> Result<()> {
        if self.originals.is_some() {
            return Err(Error::InvalidOperation(
                "called save_originals twice without retrieve_originals".to_string(),
            ));
        }
        self.originals = Some(Originals::new());
        Ok(())
    }

    /// Stop recording and return what was recorded.
    ///
    /// # Errors
    ///
    /// `InvalidOperation` without a preceding `save_originals`.
    pub fn retrieve_originals(&mut self) -> Result<Originals> {
        self.originals.take().ok_or_else(|| {
            Error::InvalidOperation("called retrieve_originals without save_originals".to_string())
        })
    }

    fn save_original(&mut self, id: &DocId, doc: Option<Document>) {
        if let Some(originals) = self.originals.as_mut() {
            originals.entry(id.clone()).or_insert(doc);
        }
    }
}
