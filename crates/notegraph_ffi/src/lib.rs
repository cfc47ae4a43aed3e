//! Flutter bridge for the note-graph core.

pub mod api;
