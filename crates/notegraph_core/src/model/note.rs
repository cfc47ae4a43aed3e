//! Note domain model.
//!
//! # Responsibility
//! - Define the canonical note record and its two edge relations.
//! - Provide lifecycle helpers for timestamps and edge bookkeeping.
//!
//! # Invariants
//! - `id` is stable and never reused for another note.
//! - A note never links or relates to itself.
//! - One target never appears in both `links_to` and `related_to`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Opaque note identifier.
///
/// Freshly created notes get a UUID v4 string; imported notes keep whatever
/// id the payload carried.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(String);

impl NoteId {
    /// Generates a fresh, globally unique id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for NoteId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NoteId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for NoteId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Validation errors for persisted or imported notes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteValidationError {
    EmptyId,
    SelfLink(NoteId),
    SelfRelation(NoteId),
    /// Target is both a child and a lateral peer of the same note.
    DualRelation { note: NoteId, target: NoteId },
}

impl Display for NoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyId => write!(f, "note id must not be empty"),
            Self::SelfLink(id) => write!(f, "note {id} links to itself"),
            Self::SelfRelation(id) => write!(f, "note {id} relates to itself"),
            Self::DualRelation { note, target } => write!(
                f,
                "note {note} holds both a link and a relation to {target}"
            ),
        }
    }
}

impl Error for NoteValidationError {}

/// Canonical note record.
///
/// Serialized with camelCase keys; this is also the import/export
/// interchange shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    /// Display key. Not unique.
    pub title: String,
    #[serde(default)]
    pub content: String,
    /// Hierarchical edges: every id here is a child ("downer") of this note.
    #[serde(default)]
    pub links_to: BTreeSet<NoteId>,
    /// Lateral edges, mirrored on the other side by the relationship mutator.
    #[serde(default)]
    pub related_to: BTreeSet<NoteId>,
    #[serde(default)]
    pub is_favorite: bool,
    /// Unix epoch milliseconds.
    #[serde(default = "now_epoch_ms")]
    pub created_at: i64,
    /// Unix epoch milliseconds.
    #[serde(default = "now_epoch_ms")]
    pub modified_at: i64,
}

impl Note {
    /// Creates an empty note with a generated id.
    pub fn new(title: impl Into<String>) -> Self {
        Self::with_id(NoteId::generate(), title)
    }

    /// Creates an empty note with a caller-provided id.
    ///
    /// Used by import paths where identity already exists externally.
    pub fn with_id(id: NoteId, title: impl Into<String>) -> Self {
        let now = now_epoch_ms();
        Self {
            id,
            title: title.into(),
            content: String::new(),
            links_to: BTreeSet::new(),
            related_to: BTreeSet::new(),
            is_favorite: false,
            created_at: now,
            modified_at: now,
        }
    }

    /// Refreshes `modified_at`.
    pub fn touch(&mut self) {
        self.modified_at = now_epoch_ms().max(self.modified_at);
    }

    pub fn has_content(&self) -> bool {
        !self.content.trim().is_empty()
    }

    /// Removes every edge this note holds toward `other`, in both relations.
    ///
    /// Returns whether anything changed.
    pub fn detach(&mut self, other: &NoteId) -> bool {
        let unlinked = self.links_to.remove(other);
        let unrelated = self.related_to.remove(other);
        unlinked || unrelated
    }

    pub fn validate(&self) -> Result<(), NoteValidationError> {
        if self.id.as_str().trim().is_empty() {
            return Err(NoteValidationError::EmptyId);
        }
        if self.links_to.contains(&self.id) {
            return Err(NoteValidationError::SelfLink(self.id.clone()));
        }
        if self.related_to.contains(&self.id) {
            return Err(NoteValidationError::SelfRelation(self.id.clone()));
        }
        if let Some(target) = self.links_to.intersection(&self.related_to).next() {
            return Err(NoteValidationError::DualRelation {
                note: self.id.clone(),
                target: target.clone(),
            });
        }
        Ok(())
    }
}

/// Current wall-clock time in Unix epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX)
        })
}

#[cfg(test)]
mod tests {
    use super::{Note, NoteId, NoteValidationError};

    #[test]
    fn validate_rejects_self_link() {
        let mut note = Note::new("loop");
        note.links_to.insert(note.id.clone());
        assert!(matches!(
            note.validate(),
            Err(NoteValidationError::SelfLink(_))
        ));
    }

    #[test]
    fn validate_rejects_link_and_relation_to_same_target() {
        let mut note = Note::new("a");
        let target = NoteId::from("b");
        note.links_to.insert(target.clone());
        note.related_to.insert(target.clone());
        assert_eq!(
            note.validate(),
            Err(NoteValidationError::DualRelation {
                note: note.id.clone(),
                target,
            })
        );
    }

    #[test]
    fn detach_clears_both_relations() {
        let mut note = Note::new("a");
        let target = NoteId::from("b");
        note.links_to.insert(target.clone());
        assert!(note.detach(&target));
        assert!(!note.detach(&target));
        assert!(note.links_to.is_empty());
    }

    #[test]
    fn deserialize_fills_defaults_for_missing_keys() {
        let note: Note = serde_json::from_str(r#"{"id":"x","title":"Only title"}"#)
            .expect("minimal note should deserialize");
        assert_eq!(note.id.as_str(), "x");
        assert!(note.content.is_empty());
        assert!(note.links_to.is_empty());
        assert!(!note.is_favorite);
        assert!(note.created_at > 0);
    }
}
