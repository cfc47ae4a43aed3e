//! Note store contract and persistence implementation.
//!
//! # Responsibility
//! - Define the minimal CRUD + reverse-edge contract the graph core consumes.
//! - Isolate SQLite query details from topology/mutation/session logic.
//!
//! # Invariants
//! - Store writes enforce `Note::validate()` before persistence.
//! - A missing note is `Ok(None)`, never an error; only store failures
//!   propagate as `StoreError`.

pub mod meta;
pub mod note_repo;
