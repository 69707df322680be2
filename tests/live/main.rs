//! Live Query Integration Tests
//!
//! Result maintenance and change notification across insert, update and
//! remove, including windowed recomputation and pause/resume.

#[path = "../common/mod.rs"]
mod common;

mod pause_resume;
mod unordered;
mod windowed;
