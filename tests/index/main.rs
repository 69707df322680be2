//! Secondary Index Integration Tests
//!
//! Index maintenance through the collection surface, candidate resolution,
//! and property tests tying every index to the document table.

#[path = "../common/mod.rs"]
mod common;

mod candidates;
mod consistency;
mod lookup_scenarios;
