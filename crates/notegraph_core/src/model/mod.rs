//! Domain model for the note graph.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//!
//! # Invariants
//! - Every note is identified by a stable `NoteId`.
//! - Deletion is a hard delete; edge cleanup is the store's job.

pub mod note;
pub mod settings;
