//! Graph core: topology derivation and relationship edits.
//!
//! # Responsibility
//! - Derive the four-directional view around one focal note.
//! - Enforce edge exclusivity when relationships change.
//! - Declare which mutations invalidate a derived topology.

pub mod cache;
pub mod relationship;
pub mod topology;
