//! Query pipeline
//!
//! A [`Query`] bundles a matcher, an optional sorter, and a skip/limit
//! window. Running it over a [`DocumentStore`]:
//!
//! 1. resolves candidates (exact id, `_id` list, index intersection, or the
//!    whole table)
//! 2. confirms each candidate with the matcher, recording distances
//! 3. sorts, then applies skip and limit
//!
//! Results are copies; nothing returned aliases the table.

use crate::matcher::SelectorMatcher;
use crate::sorter::{FieldSorter, SortSpec};
use minidoc_core::{DistanceMap, DocId, Document, MatchResult, Matcher, Result, Selector, Sorter};
use minidoc_storage::DocumentStore;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Sort and window options for `find` and `observe`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    /// Sort keys; `None` keeps candidate order
    pub sort: Option<SortSpec>,
    /// Number of leading results to drop
    pub skip: usize,
    /// Maximum number of results; `Some(0)` means no limit
    pub limit: Option<usize>,
}

impl FindOptions {
    /// No sort, no window
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sort spec
    pub fn sort(mut self, spec: SortSpec) -> Self {
        self.sort = Some(spec);
        self
    }

    /// Set skip
    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    /// Set limit
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Output of one pipeline run
#[derive(Debug, Clone, Default)]
pub struct QueryOutput {
    /// Matching documents in result order
    pub docs: Vec<(DocId, Document)>,
    /// Distances reported by a geo matcher
    pub distances: Option<DistanceMap>,
}

/// Matcher, sorter and window
#[derive(Clone)]
pub struct Query {
    matcher: Arc<dyn Matcher>,
    sorter: Option<Arc<dyn Sorter>>,
    skip: usize,
    limit: Option<usize>,
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("selector", self.matcher.selector())
            .field("sorted", &self.sorter.is_some())
            .field("skip", &self.skip)
            .field("limit", &self.limit)
            .finish()
    }
}

impl Query {
    /// Build a query from a selector and options using the default
    /// matcher and sorter.
    pub fn new(selector: Selector, options: FindOptions) -> Result<Self> {
        let matcher: Arc<dyn Matcher> = Arc::new(SelectorMatcher::new(selector)?);
        let sorter = options
            .sort
            .map(|spec| Arc::new(FieldSorter::new(spec)) as Arc<dyn Sorter>);
        let mut query = Self::with_capabilities(matcher, sorter).skip(options.skip);
        if let Some(limit) = options.limit {
            query = query.limit(limit);
        }
        Ok(query)
    }

    /// Query matching every document
    pub fn all() -> Self {
        Self::with_capabilities(Arc::new(SelectorMatcher::all()), None)
    }

    /// Build a query from caller-supplied capabilities.
    ///
    /// A matcher with a geo query and no sorter gets a distance-only sorter.
    pub fn with_capabilities(matcher: Arc<dyn Matcher>, sorter: Option<Arc<dyn Sorter>>) -> Self {
        let sorter = sorter.or_else(|| {
            matcher
                .has_geo_query()
                .then(|| Arc::new(FieldSorter::default()) as Arc<dyn Sorter>)
        });
        Self {
            matcher,
            sorter,
            skip: 0,
            limit: None,
        }
    }

    /// Set skip
    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    /// Set limit; zero means no limit
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = (limit > 0).then_some(limit);
        self
    }

    /// The matcher
    pub fn matcher(&self) -> &dyn Matcher {
        self.matcher.as_ref()
    }

    /// The sorter, if any
    pub fn sorter(&self) -> Option<&dyn Sorter> {
        self.sorter.as_deref()
    }

    /// Whether skip or limit is set
    pub fn is_windowed(&self) -> bool {
        self.skip > 0 || self.limit.is_some()
    }

    /// Whether results are sorted
    pub fn is_sorted(&self) -> bool {
        self.sorter.is_some()
    }

    /// Match one document
    pub fn matches(&self, doc: &Document) -> MatchResult {
        self.matcher.document_matches(doc)
    }

    /// Run the pipeline
    pub fn run(&self, store: &DocumentStore) -> QueryOutput {
        let mut distances = self.matcher.has_geo_query().then(DistanceMap::new);

        if let Some(id) = self.matcher.exact_id() {
            let mut docs = Vec::new();
            if self.skip == 0 {
                if let Some(doc) = store.get(&id) {
                    let m = self.matcher.document_matches(doc);
                    if m.matched {
                        record_distance(&mut distances, &id, m);
                        docs.push((id, doc.clone()));
                    }
                }
            }
            return QueryOutput { docs, distances };
        }

        // Without sort or skip, scanning can stop once the limit is reached.
        let stop_at = self.limit.filter(|_| self.skip == 0 && self.sorter.is_none());
        let mut docs = Vec::new();
        for (id, doc) in store.possibly_matching(self.matcher.selector()) {
            let m = self.matcher.document_matches(doc);
            if !m.matched {
                continue;
            }
            record_distance(&mut distances, id, m);
            docs.push((id.clone(), doc.clone()));
            if stop_at.map_or(false, |limit| docs.len() >= limit) {
                break;
            }
        }

        if let Some(sorter) = &self.sorter {
            let cmp = sorter.comparator(distances.as_ref());
            docs.sort_by(|a, b| cmp(&a.1, &b.1));
        }

        if self.is_windowed() {
            docs = docs
                .into_iter()
                .skip(self.skip)
                .take(self.limit.unwrap_or(usize::MAX))
                .collect();
        }
        QueryOutput { docs, distances }
    }

    /// Run the pipeline and key the results by id
    pub fn run_unordered(&self, store: &DocumentStore) -> BTreeMap<DocId, Document> {
        self.run(store).docs.into_iter().collect()
    }
}

fn record_distance(distances: &mut Option<DistanceMap>, id: &DocId, m: MatchResult) {
    if let (Some(map), Some(distance)) = (distances.as_mut(), m.distance) {
        map.insert(id.clone(), distance);
    }
}
