//! Topology as a derived cache with an explicit invalidation table.
//!
//! # Invariants
//! - Structural mutations (edges, deletes, creations as link targets,
//!   recenters, imports) mark the cache stale.
//! - Rename, content edit and favorite toggle alone do not; the session
//!   patches the edited note into the cached lists instead.

use crate::graph::topology::{compute_topology, Topology};
use crate::model::note::{Note, NoteId};
use crate::model::settings::SortPolicy;
use crate::repo::note_repo::{NoteStore, StoreResult};

/// Mutation events the session reports to the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphMutation {
    Link,
    Unlink,
    Delete,
    /// A note was created and immediately linked into the neighbourhood.
    CreateAsTarget,
    Recenter,
    Import,
    Rename,
    ContentEdit,
    FavoriteToggle,
}

impl GraphMutation {
    /// Whether this mutation can change any topology list.
    pub fn invalidates_topology(self) -> bool {
        match self {
            Self::Link
            | Self::Unlink
            | Self::Delete
            | Self::CreateAsTarget
            | Self::Recenter
            | Self::Import => true,
            Self::Rename | Self::ContentEdit | Self::FavoriteToggle => false,
        }
    }
}

/// Last computed (sorted) topology plus the focal id it was computed for.
#[derive(Debug, Clone, Default)]
pub struct TopologyCache {
    focal: Option<NoteId>,
    policy: SortPolicy,
    topology: Topology,
    stale: bool,
}

impl TopologyCache {
    pub fn new(policy: SortPolicy) -> Self {
        Self {
            policy,
            stale: true,
            ..Self::default()
        }
    }

    pub fn focal(&self) -> Option<&NoteId> {
        self.focal.as_ref()
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Points the cache at a new focal note; always invalidates.
    pub fn refocus(&mut self, focal: NoteId) {
        self.focal = Some(focal);
        self.note_mutation(GraphMutation::Recenter);
    }

    pub fn set_policy(&mut self, policy: SortPolicy) {
        if self.policy != policy {
            self.policy = policy;
            self.stale = true;
        }
    }

    /// Records a mutation, marking the cache stale when the table says so.
    ///
    /// Returns whether the mutation invalidated the cache.
    pub fn note_mutation(&mut self, mutation: GraphMutation) -> bool {
        let invalidates = mutation.invalidates_topology();
        if invalidates {
            self.stale = true;
        }
        invalidates
    }

    /// Replaces cached copies of `note` without recomputing.
    ///
    /// Lists are re-sorted afterwards since a title or timestamp change can
    /// move the note under the active policy.
    pub fn patch(&mut self, note: &Note) {
        if !self.topology.contains(&note.id) {
            return;
        }
        let mut topology = std::mem::take(&mut self.topology);
        let center = topology.center.iter_mut();
        let lists = [
            &mut topology.uppers,
            &mut topology.downers,
            &mut topology.lefters,
            &mut topology.righters,
        ];
        for cached in center.chain(lists.into_iter().flat_map(|notes| notes.iter_mut())) {
            if cached.id == note.id {
                *cached = note.clone();
            }
        }
        self.topology = topology.sorted(self.policy);
    }

    /// Last computed topology, possibly stale.
    pub fn peek(&self) -> &Topology {
        &self.topology
    }

    /// Returns the cached topology, recomputing first when stale.
    pub fn get_or_compute(&mut self, store: &impl NoteStore) -> StoreResult<&Topology> {
        if self.stale {
            self.topology = match &self.focal {
                Some(focal) => compute_topology(store, focal)?.sorted(self.policy),
                None => Topology::empty(),
            };
            self.stale = false;
        }
        Ok(&self.topology)
    }
}
