//! Keyboard navigation over the sectioned layout.
//!
//! # Responsibility
//! - Model which section/index is focused and which notes are selected.
//! - Translate input events into focus transitions and structural effects.
//!
//! # Invariants
//! - Everything here is synchronous and storage-free; effects are executed by
//!   the session layer.

pub mod automaton;
pub mod focus;
pub mod layout;
pub mod section;
