//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store, graph and navigation calls into session-level APIs.
//! - Keep UI/FFI layers decoupled from storage details.

pub mod graph_service;
