//! Id generators for documents inserted without `_id`

use minidoc_core::{DocId, IdGenerator};
use uuid::Uuid;

/// Random v4 UUIDs in simple (hyphen-free) form
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&mut self) -> DocId {
        DocId::new(Uuid::new_v4().simple().to_string())
    }
}

/// Deterministic `prefix` + counter ids, for tests and reproducible runs
#[derive(Debug, Clone)]
pub struct SequentialIdGenerator {
    prefix: String,
    next: u64,
}

impl SequentialIdGenerator {
    /// Start at 1 with the given prefix
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 1,
        }
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&mut self) -> DocId {
        let id = DocId::new(format!("{}{}", self.prefix, self.next));
        self.next += 1;
        id
    }
}
