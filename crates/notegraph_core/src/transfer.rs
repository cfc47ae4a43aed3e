//! Import/export of the full note set as a JSON array.
//!
//! # Responsibility
//! - Dump every note in the interchange shape.
//! - Validate a payload completely before any store mutation.
//! - Apply overwrite or merge imports in a single store transaction.
//!
//! # Invariants
//! - A malformed payload aborts with `ImportError::Format` and leaves the
//!   store untouched.
//! - Merge never reuses payload ids and never overwrites an existing note.
//! - Every note renamed by a merge is linked under one batch note.

use crate::model::note::{Note, NoteId};
use crate::repo::meta::{save_note_pointer, MetaKey};
use crate::repo::note_repo::{NoteStore, StoreError, StoreResult};
use log::info;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

static NUMBERED_SUFFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.*\S)\s+\((\d+)\)$").expect("valid suffix regex"));

const IMPORT_BATCH_TITLE: &str = "Import";

/// How an import treats the existing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportMode {
    /// Replace the store wholesale.
    Overwrite,
    /// Add alongside existing notes under fresh ids.
    Merge,
}

#[derive(Debug)]
pub enum ImportError {
    /// Payload is not a valid note array. Nothing was written.
    Format(String),
    Store(StoreError),
}

impl Display for ImportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Format(message) => write!(f, "invalid import payload: {message}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ImportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Format(_) => None,
            Self::Store(err) => Some(err),
        }
    }
}

impl From<StoreError> for ImportError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Outcome of an import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub imported: usize,
    /// Ids (post-import) of notes whose titles were changed to avoid clashes.
    pub renamed: Vec<NoteId>,
    /// Synthetic parent of all renamed notes, when any were renamed.
    pub batch_note: Option<NoteId>,
    /// First imported note (post-import id), in payload order.
    pub first_note: Option<NoteId>,
}

/// Serializes every note, oldest first.
pub fn export_json(store: &impl NoteStore) -> StoreResult<String> {
    let notes = store.list_all()?;
    info!("event=export module=transfer status=ok notes={}", notes.len());
    serde_json::to_string_pretty(&notes)
        .map_err(|err| StoreError::InvalidData(format!("cannot encode export: {err}")))
}

/// Parses and validates an import payload without touching any store.
///
/// Lateral edges are mirrored so both sides hold them. A pair that ends up
/// with two relations across notes (mutual links, or a link plus a lateral
/// edge) is rejected like the same conflict inside one note.
pub fn parse_payload(payload: &str) -> Result<Vec<Note>, ImportError> {
    let mut notes: Vec<Note> =
        serde_json::from_str(payload).map_err(|err| ImportError::Format(err.to_string()))?;

    let mut ids = HashSet::with_capacity(notes.len());
    for (position, note) in notes.iter().enumerate() {
        note.validate()
            .map_err(|err| ImportError::Format(format!("note #{position}: {err}")))?;
        if !ids.insert(&note.id) {
            return Err(ImportError::Format(format!(
                "note #{position}: duplicate id `{}`",
                note.id
            )));
        }
    }
    reconcile_relations(&mut notes)?;
    Ok(notes)
}

fn reconcile_relations(notes: &mut [Note]) -> Result<(), ImportError> {
    let position: HashMap<NoteId, usize> = notes
        .iter()
        .enumerate()
        .map(|(index, note)| (note.id.clone(), index))
        .collect();

    let mut linked = HashSet::new();
    for note in notes.iter() {
        for target in note.links_to.iter().filter(|id| position.contains_key(*id)) {
            if !linked.insert(unordered_pair(&note.id, target)) {
                return Err(ImportError::Format(format!(
                    "notes `{}` and `{target}` link to each other",
                    note.id
                )));
            }
        }
    }

    let mut lateral = BTreeSet::new();
    for note in notes.iter() {
        for target in note.related_to.iter().filter(|id| position.contains_key(*id)) {
            let pair = unordered_pair(&note.id, target);
            if linked.contains(&pair) {
                return Err(ImportError::Format(format!(
                    "notes `{}` and `{target}` are both linked and related",
                    note.id
                )));
            }
            lateral.insert(pair);
        }
    }

    for (a, b) in lateral {
        notes[position[&a]].related_to.insert(b.clone());
        notes[position[&b]].related_to.insert(a);
    }
    Ok(())
}

fn unordered_pair(a: &NoteId, b: &NoteId) -> (NoteId, NoteId) {
    if a <= b {
        (a.clone(), b.clone())
    } else {
        (b.clone(), a.clone())
    }
}

/// Imports a JSON payload in the given mode.
///
/// # Errors
/// - `Format` when the payload fails validation; the store is untouched.
/// - `Store` when persistence fails.
pub fn import_json(
    store: &mut impl NoteStore,
    payload: &str,
    mode: ImportMode,
) -> Result<ImportReport, ImportError> {
    let notes = parse_payload(payload)?;
    let report = match mode {
        ImportMode::Overwrite => overwrite(store, notes)?,
        ImportMode::Merge => merge(store, notes)?,
    };
    info!(
        "event=import module=transfer status=ok mode={} imported={} renamed={}",
        match mode {
            ImportMode::Overwrite => "overwrite",
            ImportMode::Merge => "merge",
        },
        report.imported,
        report.renamed.len()
    );
    Ok(report)
}

fn overwrite(store: &mut impl NoteStore, notes: Vec<Note>) -> StoreResult<ImportReport> {
    store.replace_all(&notes)?;
    let first_note = notes.first().map(|note| note.id.clone());
    save_note_pointer(store, MetaKey::CentralNote, first_note.as_ref())?;
    save_note_pointer(store, MetaKey::HomeNote, first_note.as_ref())?;
    Ok(ImportReport {
        imported: notes.len(),
        renamed: Vec::new(),
        batch_note: None,
        first_note,
    })
}

fn merge(store: &mut impl NoteStore, notes: Vec<Note>) -> StoreResult<ImportReport> {
    let mut taken: HashSet<String> = store
        .list_all()?
        .into_iter()
        .map(|note| note.title.to_lowercase())
        .collect();
    let id_map: HashMap<NoteId, NoteId> = notes
        .iter()
        .map(|note| (note.id.clone(), NoteId::generate()))
        .collect();
    let remap = |ids: &BTreeSet<NoteId>| -> BTreeSet<NoteId> {
        ids.iter()
            .filter_map(|id| id_map.get(id).cloned())
            .collect()
    };

    let mut imported = Vec::with_capacity(notes.len() + 1);
    let mut renamed = Vec::new();
    for note in &notes {
        let mut fresh = note.clone();
        fresh.id = id_map[&note.id].clone();
        fresh.links_to = remap(&note.links_to);
        fresh.related_to = remap(&note.related_to);
        if taken.contains(&note.title.to_lowercase()) {
            fresh.title = unique_title(&note.title, &taken);
            renamed.push(fresh.id.clone());
        }
        taken.insert(fresh.title.to_lowercase());
        imported.push(fresh);
    }

    let batch_note = if renamed.is_empty() {
        None
    } else {
        let mut batch = Note::new(unique_title(IMPORT_BATCH_TITLE, &taken));
        batch.links_to = renamed.iter().cloned().collect();
        let id = batch.id.clone();
        imported.push(batch);
        Some(id)
    };

    store.put_many(&imported)?;
    Ok(ImportReport {
        imported: notes.len(),
        renamed,
        batch_note,
        first_note: notes.first().map(|note| id_map[&note.id].clone()),
    })
}

/// Returns `title` or `"<base> (n)"` with the smallest `n >= 2` not in `taken`.
///
/// `taken` holds lowercase titles. An existing numeric suffix on `title` is
/// replaced rather than stacked.
pub fn unique_title(title: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(&title.to_lowercase()) {
        return title.to_string();
    }
    let base = NUMBERED_SUFFIX_RE
        .captures(title)
        .and_then(|caps| caps.get(1))
        .map_or(title, |base| base.as_str());

    (2u64..)
        .map(|n| format!("{base} ({n})"))
        .find(|candidate| !taken.contains(&candidate.to_lowercase()))
        .unwrap_or_else(|| format!("{base} ({})", taken.len() + 2))
}
