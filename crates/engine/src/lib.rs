//! Query and live-query engine for minidoc
//!
//! This crate builds the user-facing surface on top of the storage layer:
//! - Collection: insert/remove/update/find/observe over one document table
//! - Query: candidates, matcher confirmation, sort, skip, limit
//! - Live queries: result sets kept current across mutations, with change
//!   events delivered before each mutating call returns
//! - Default capabilities: SelectorMatcher, FieldSorter, UpdateSpec, id
//!   generators
//! - CollectionConfig: TOML configuration
//!
//! The engine is the only component that knows about:
//! - Change notification and its ordering
//! - Pause/resume and saved originals

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod collection;
pub mod config;
pub mod id;
pub mod live;
pub mod matcher;
pub mod modifier;
pub mod observe;
pub mod query;
pub mod sorter;

pub use collection::{Collection, Originals, UpdateReport};
pub use config::CollectionConfig;
pub use id::{SequentialIdGenerator, UuidGenerator};
pub use live::{LiveQuery, LiveQueryCoordinator, MatchedBefore, QueryResults, RecomputeSet};
pub use matcher::SelectorMatcher;
pub use modifier::{FieldUpdate, UpdateSpec};
pub use observe::{ChangeEvent, LiveQueryHandle, NotificationQueue, ObserveCallback};
pub use query::{FindOptions, Query, QueryOutput};
pub use sorter::{Direction, FieldSorter, SortSpec};
