//! Core domain logic for the note graph.
//! Storage, topology, relationship edits and keyboard navigation live here;
//! front ends only render what this crate derives.

pub mod db;
pub mod graph;
pub mod logging;
pub mod model;
pub mod nav;
pub mod repo;
pub mod search;
pub mod service;
pub mod transfer;
pub mod vault;

pub use graph::relationship::{RelationKind, RelationshipReport, SkipReason};
pub use graph::topology::{compute_topology, Topology};
pub use logging::{init_logging, logging_status, LogLevel, LoggingError};
pub use model::note::{Note, NoteId, NoteValidationError};
pub use model::settings::{SortPolicy, VaultSettings};
pub use nav::automaton::{transition, Effect, NavEvent, Transition};
pub use nav::focus::FocusState;
pub use nav::layout::{ColumnLayout, FixedColumns, SingleColumn};
pub use nav::section::{Direction, NavContext, Section, Visibility};
pub use repo::note_repo::{NoteStore, SqliteNoteStore, StoreError, StoreResult};
pub use search::{SearchError, SearchIndex, SearchResult};
pub use service::graph_service::{GraphResult, GraphService, GraphServiceError};
pub use transfer::{ImportError, ImportMode, ImportReport};
pub use vault::{Vault, VaultError};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
