//! Topology engine: the five-set view around one focal note.
//!
//! # Responsibility
//! - Derive uppers, downers, lefters and righters from a focal id.
//! - Sort the derived lists by a caller-chosen policy.
//!
//! # Invariants
//! - An unknown focal id yields an empty topology, never an error.
//! - `righters` never contains the focal note and holds each id once.
//! - Work is bounded to two hops from the focal note, so graph cycles
//!   elsewhere cannot cause unbounded traversal.

use crate::model::note::{Note, NoteId};
use crate::model::settings::SortPolicy;
use crate::repo::note_repo::{NoteStore, StoreResult};
use log::debug;
use std::cmp::Reverse;
use std::collections::HashSet;

/// Derived neighbourhood of the central note. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Topology {
    pub center: Option<Note>,
    /// Parents: notes whose `links_to` contains the center.
    pub uppers: Vec<Note>,
    /// Children: notes the center links to.
    pub downers: Vec<Note>,
    /// Lateral peers: notes the center relates to.
    pub lefters: Vec<Note>,
    /// Contextual siblings: other children of the center's parents.
    pub righters: Vec<Note>,
}

impl Topology {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn center_id(&self) -> Option<&NoteId> {
        self.center.as_ref().map(|note| &note.id)
    }

    pub fn is_empty(&self) -> bool {
        self.center.is_none()
    }

    /// Whether `id` is the center or appears in any list.
    pub fn contains(&self, id: &NoteId) -> bool {
        self.center_id() == Some(id)
            || [&self.uppers, &self.downers, &self.lefters, &self.righters]
                .into_iter()
                .any(|notes| notes.iter().any(|note| &note.id == id))
    }

    /// Returns the topology with every list ordered by `policy`.
    pub fn sorted(mut self, policy: SortPolicy) -> Self {
        for notes in [
            &mut self.uppers,
            &mut self.downers,
            &mut self.lefters,
            &mut self.righters,
        ] {
            sort_notes(notes, policy);
        }
        self
    }
}

/// Orders notes in place by the given policy, ties broken by id.
pub fn sort_notes(notes: &mut [Note], policy: SortPolicy) {
    match policy {
        SortPolicy::Title => {
            notes.sort_by_cached_key(|note| (note.title.to_lowercase(), note.id.clone()))
        }
        SortPolicy::Created => notes.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        }),
        SortPolicy::Modified => notes.sort_by(|a, b| {
            Reverse(a.modified_at)
                .cmp(&Reverse(b.modified_at))
                .then_with(|| a.id.cmp(&b.id))
        }),
    }
}

/// Computes the topology around `focal`.
///
/// Cost is one lookup, one reverse-edge query, two batch lookups for the
/// center's own edges and one batch lookup per upper.
///
/// # Errors
/// Only store failures; missing notes are skipped.
pub fn compute_topology(store: &impl NoteStore, focal: &NoteId) -> StoreResult<Topology> {
    let Some(center) = store.get(focal)? else {
        debug!("event=topology_compute module=graph status=skip reason=center_missing");
        return Ok(Topology::empty());
    };

    let uppers = store.find_by_reverse_edge(focal)?;
    let downers = resolve(store, center.links_to.iter())?;
    let lefters = resolve(store, center.related_to.iter())?;

    let mut seen: HashSet<NoteId> = HashSet::new();
    let mut righters = Vec::new();
    for upper in &uppers {
        let siblings = resolve(
            store,
            upper.links_to.iter().filter(|id| *id != focal && !seen.contains(*id)),
        )?;
        for sibling in siblings {
            if seen.insert(sibling.id.clone()) {
                righters.push(sibling);
            }
        }
    }

    debug!(
        "event=topology_compute module=graph status=ok uppers={} downers={} lefters={} righters={}",
        uppers.len(),
        downers.len(),
        lefters.len(),
        righters.len()
    );

    Ok(Topology {
        center: Some(center),
        uppers,
        downers,
        lefters,
        righters,
    })
}

fn resolve<'a>(
    store: &impl NoteStore,
    ids: impl Iterator<Item = &'a NoteId>,
) -> StoreResult<Vec<Note>> {
    let ids = ids.cloned().collect::<Vec<_>>();
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    Ok(store.batch_get(&ids)?.into_iter().flatten().collect())
}
