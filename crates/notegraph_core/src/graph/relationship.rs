//! Relationship mutator: clear-then-apply edge edits between note pairs.
//!
//! # Responsibility
//! - Create and remove parent/child/lateral edges for one or many targets.
//! - Keep lateral edges symmetric and pairs mutually exclusive.
//!
//! # Invariants
//! - After any call, each (source, target) pair holds at most one relation.
//! - Each pair is persisted in a single `put_many` transaction.
//! - Self targets and vanished notes are skipped silently, never raised.
//! - Re-applying the same kind is idempotent.

use crate::model::note::{Note, NoteId};
use crate::repo::note_repo::{NoteStore, StoreResult};
use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

const TITLE_BATCH_SEPARATOR: char = ';';

/// Relationship requested between the source note and each target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    /// Target becomes a parent ("upper") of the source.
    Parent,
    /// Target becomes a child ("downer") of the source.
    Child,
    /// Source and target become lateral peers.
    Lateral,
    /// Remove whatever relation the pair holds.
    Unlink,
}

impl RelationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Parent => "parent",
            Self::Child => "child",
            Self::Lateral => "lateral",
            Self::Unlink => "unlink",
        }
    }
}

/// Why a target was left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    SelfTarget,
    NotFound,
}

/// Outcome of one `set_relationship` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationshipReport {
    pub applied: Vec<NoteId>,
    pub skipped: Vec<(NoteId, SkipReason)>,
}

impl RelationshipReport {
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty()
    }
}

/// Applies `kind` between `source` and every target.
///
/// # Errors
/// Only store failures propagate; a failure leaves already-processed pairs
/// committed and consistent.
pub fn set_relationship(
    store: &mut impl NoteStore,
    source: &NoteId,
    targets: &[NoteId],
    kind: RelationKind,
) -> StoreResult<RelationshipReport> {
    let mut report = RelationshipReport::default();
    let mut visited = HashSet::new();

    for target in targets {
        if !visited.insert(target) {
            continue;
        }
        if target == source {
            report.skipped.push((target.clone(), SkipReason::SelfTarget));
            continue;
        }

        // Re-read per pair: an earlier pair in this batch may have touched source.
        let (Some(mut source_note), Some(mut target_note)) = (store.get(source)?, store.get(target)?)
        else {
            debug!(
                "event=relationship_set module=graph status=skip reason=not_found kind={}",
                kind.as_str()
            );
            report.skipped.push((target.clone(), SkipReason::NotFound));
            continue;
        };

        if apply_pair(&mut source_note, &mut target_note, kind) {
            store.put_many(&[source_note, target_note])?;
        }
        report.applied.push(target.clone());
    }

    info!(
        "event=relationship_set module=graph status=ok kind={} applied={} skipped={}",
        kind.as_str(),
        report.applied.len(),
        report.skipped.len()
    );
    Ok(report)
}

/// Clears every edge between the two notes, then applies `kind`.
///
/// Returns whether any edge changed; only then do both notes get a fresh
/// `modified_at`.
pub fn apply_pair(source: &mut Note, target: &mut Note, kind: RelationKind) -> bool {
    let before = (
        source.links_to.clone(),
        source.related_to.clone(),
        target.links_to.clone(),
        target.related_to.clone(),
    );

    source.detach(&target.id);
    target.detach(&source.id);

    match kind {
        RelationKind::Parent => {
            target.links_to.insert(source.id.clone());
        }
        RelationKind::Child => {
            source.links_to.insert(target.id.clone());
        }
        RelationKind::Lateral => {
            source.related_to.insert(target.id.clone());
            target.related_to.insert(source.id.clone());
        }
        RelationKind::Unlink => {}
    }

    let changed = before
        != (
            source.links_to.clone(),
            source.related_to.clone(),
            target.links_to.clone(),
            target.related_to.clone(),
        );
    if changed {
        source.touch();
        target.touch();
    }
    changed
}

/// Splits picker input into the titles of notes to create.
///
/// Titles are separated by `;`, whitespace is collapsed, blanks are dropped
/// and case-insensitive duplicates keep their first spelling.
pub fn parse_new_titles(input: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    input
        .split(TITLE_BATCH_SEPARATOR)
        .map(normalize_title)
        .filter(|title| !title.is_empty())
        .filter(|title| seen.insert(title.to_lowercase()))
        .collect()
}

/// Trims a title and collapses inner whitespace runs to one space.
pub fn normalize_title(raw: &str) -> String {
    WHITESPACE_RE.replace_all(raw.trim(), " ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::{apply_pair, parse_new_titles, RelationKind};
    use crate::model::note::Note;

    #[test]
    fn parent_replaces_existing_lateral_edge() {
        let mut a = Note::new("a");
        let mut b = Note::new("b");
        apply_pair(&mut a, &mut b, RelationKind::Lateral);
        assert!(a.related_to.contains(&b.id) && b.related_to.contains(&a.id));

        apply_pair(&mut a, &mut b, RelationKind::Parent);
        assert!(b.links_to.contains(&a.id));
        assert!(a.related_to.is_empty() && b.related_to.is_empty());
        assert!(a.links_to.is_empty());
    }

    #[test]
    fn child_reverses_an_existing_parent_edge() {
        let mut a = Note::new("a");
        let mut b = Note::new("b");
        apply_pair(&mut a, &mut b, RelationKind::Parent);
        apply_pair(&mut a, &mut b, RelationKind::Child);
        assert!(a.links_to.contains(&b.id));
        assert!(!b.links_to.contains(&a.id));
    }

    #[test]
    fn unlink_only_clears() {
        let mut a = Note::new("a");
        let mut b = Note::new("b");
        assert!(apply_pair(&mut a, &mut b, RelationKind::Child));
        assert!(apply_pair(&mut a, &mut b, RelationKind::Unlink));
        assert!(!apply_pair(&mut a, &mut b, RelationKind::Unlink));
        assert!(a.links_to.is_empty() && b.links_to.is_empty());
        assert!(a.related_to.is_empty() && b.related_to.is_empty());
    }

    #[test]
    fn parse_new_titles_splits_trims_and_dedupes() {
        let titles = parse_new_titles(" Alpha ;beta;;  ALPHA ; gamma   delta ;  ");
        assert_eq!(titles, vec!["Alpha", "beta", "gamma delta"]);
    }
}
