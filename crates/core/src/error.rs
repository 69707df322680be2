//! Error types for minidoc
//!
//! Only failures that reject a whole call live here. Non-fatal conditions
//! (an index asked to drop a posting it never held, a repeated index
//! declaration) are reported as `tracing` diagnostics by the layer that
//! detects them and never surface as `Error`.

use crate::document::DocId;
use std::io;
use thiserror::Error;

/// Result type alias for minidoc operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for minidoc
#[derive(Debug, Error)]
pub enum Error {
    /// A document with this id is already stored
    #[error("Duplicate _id '{0}'")]
    DuplicateId(DocId),

    /// `_id` present but not a string
    #[error("Invalid _id: {0}")]
    InvalidId(String),

    /// Index declared over a field that cannot be indexed
    #[error("Unsupported index field: {0}")]
    UnsupportedIndexField(String),

    /// Selector could not be interpreted
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    /// Modifier could not be applied to a document
    #[error("Invalid modifier: {0}")]
    InvalidModifier(String),

    /// Modifier attempted to change a document's `_id`
    #[error("Modifier may not change _id of document '{0}'")]
    ImmutableId(DocId),

    /// Query options are inconsistent with the requested result shape
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Live query handle does not refer to an active query
    #[error("Unknown live query: {0}")]
    UnknownLiveQuery(u64),

    /// Operation not allowed in the current state
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Configuration could not be read or validated
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error while reading or writing configuration
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Create an invalid modifier error
    pub fn invalid_modifier(msg: impl Into<String>) -> Self {
        Error::InvalidModifier(msg.into())
    }

    /// Create an invalid selector error
    pub fn invalid_selector(msg: impl Into<String>) -> Self {
        Error::InvalidSelector(msg.into())
    }

    /// Create an invalid query error
    pub fn invalid_query(msg: impl Into<String>) -> Self {
        Error::InvalidQuery(msg.into())
    }
}
