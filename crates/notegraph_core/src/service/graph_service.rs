//! Graph session use-case service.
//!
//! # Responsibility
//! - Own one vault's store together with the central note, the focus state,
//!   the favorites list and the topology cache.
//! - Feed navigation events through the automaton and execute the effects it
//!   emits (recenter, relate, delete).
//! - Route every mutation through the cache invalidation table.
//!
//! # Invariants
//! - After any public call returns `Ok`, the cached topology is fresh for the
//!   current center and the focus state is clamped against it.
//! - The session always has a center once opened; deleting it falls back to
//!   the home note, then the first note, then a freshly seeded one.
//! - The persisted central pointer follows every recenter.

use crate::graph::cache::{GraphMutation, TopologyCache};
use crate::graph::relationship::{
    normalize_title, parse_new_titles, set_relationship, RelationKind, RelationshipReport,
};
use crate::graph::topology::{sort_notes, Topology};
use crate::model::note::{Note, NoteId};
use crate::model::settings::VaultSettings;
use crate::nav::automaton::{transition, Effect, NavEvent};
use crate::nav::focus::FocusState;
use crate::nav::layout::{ColumnLayout, SingleColumn};
use crate::nav::section::{NavContext, Visibility};
use crate::repo::meta::{
    load_favorites, load_note_pointer, load_settings, save_note_pointer, save_settings, MetaKey,
};
use crate::repo::note_repo::{NoteStore, StoreError};
use crate::search::fts::{ContentHit, ContentQuery};
use crate::search::title::TitleHit;
use crate::search::{SearchError, SearchIndex};
use crate::transfer::{export_json, import_json, ImportError, ImportMode, ImportReport};
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Title given to the note seeded into an empty vault.
pub const SEED_NOTE_TITLE: &str = "Home";
/// Title used when a rename or creation normalizes to nothing.
pub const UNTITLED_NOTE_TITLE: &str = "Untitled";

/// Service error for graph session use-cases.
#[derive(Debug)]
pub enum GraphServiceError {
    /// Target note does not exist.
    NoteNotFound(NoteId),
    /// Relation kind is not valid for this operation.
    UnsupportedRelation(RelationKind),
    Store(StoreError),
    Import(ImportError),
    Search(SearchError),
}

impl Display for GraphServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoteNotFound(id) => write!(f, "note not found: {id}"),
            Self::UnsupportedRelation(kind) => {
                write!(f, "relation `{}` cannot be used here", kind.as_str())
            }
            Self::Store(err) => write!(f, "{err}"),
            Self::Import(err) => write!(f, "{err}"),
            Self::Search(err) => write!(f, "{err}"),
        }
    }
}

impl Error for GraphServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NoteNotFound(_) | Self::UnsupportedRelation(_) => None,
            Self::Store(err) => Some(err),
            Self::Import(err) => Some(err),
            Self::Search(err) => Some(err),
        }
    }
}

impl From<StoreError> for GraphServiceError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<ImportError> for GraphServiceError {
    fn from(value: ImportError) -> Self {
        match value {
            ImportError::Store(err) => Self::Store(err),
            other => Self::Import(other),
        }
    }
}

impl From<SearchError> for GraphServiceError {
    fn from(value: SearchError) -> Self {
        Self::Search(value)
    }
}

pub type GraphResult<T> = Result<T, GraphServiceError>;

/// Graph session facade over one note store.
pub struct GraphService<S: NoteStore> {
    store: S,
    settings: VaultSettings,
    cache: TopologyCache,
    focus: FocusState,
    favorites: Vec<Note>,
}

impl<S: NoteStore> GraphService<S> {
    /// Opens a session, restoring the persisted center when it still exists.
    pub fn open(store: S) -> GraphResult<Self> {
        let settings = load_settings(&store)?;
        let mut service = Self {
            store,
            cache: TopologyCache::new(settings.sort_policy),
            settings,
            focus: FocusState::new(),
            favorites: Vec::new(),
        };

        let center = match load_note_pointer(&service.store, MetaKey::CentralNote)? {
            Some(id) if service.store.get(&id)?.is_some() => id,
            _ => service.fallback_center()?,
        };
        service.set_center(center)?;
        info!("event=session_open module=service status=ok");
        Ok(service)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn center_id(&self) -> Option<&NoteId> {
        self.cache.focal()
    }

    /// Current (fresh, sorted) topology around the center.
    pub fn topology(&self) -> &Topology {
        self.cache.peek()
    }

    /// Favorite notes, sorted by the active policy.
    pub fn favorites(&self) -> &[Note] {
        &self.favorites
    }

    pub fn focus(&self) -> &FocusState {
        &self.focus
    }

    pub fn settings(&self) -> &VaultSettings {
        &self.settings
    }

    pub fn visibility(&self) -> Visibility {
        Visibility::from(&self.settings)
    }

    /// Read-only context the automaton and renderers consume.
    pub fn nav_context<'a>(&'a self, layout: &'a dyn ColumnLayout) -> NavContext<'a> {
        NavContext::new(self.cache.peek(), &self.favorites, self.visibility(), layout)
    }

    pub fn get_note(&self, id: &NoteId) -> GraphResult<Note> {
        self.store
            .get(id)?
            .ok_or_else(|| GraphServiceError::NoteNotFound(id.clone()))
    }

    /// Runs one navigation event and executes the effect it emits.
    ///
    /// Returns the executed effect, if any.
    pub fn apply(
        &mut self,
        event: NavEvent,
        layout: &dyn ColumnLayout,
    ) -> GraphResult<Option<Effect>> {
        let next = transition(&self.focus, event, &self.nav_context(layout));
        self.focus = next.state;

        match &next.effect {
            None => {}
            Some(Effect::Recenter(id)) => {
                self.recenter(id)?;
            }
            Some(Effect::Relate { kind, targets }) => {
                if let Some(center) = self.center_id().cloned() {
                    self.relate(&center, targets, *kind)?;
                }
            }
            Some(Effect::Delete(ids)) => {
                self.delete_notes(ids)?;
            }
        }
        Ok(next.effect)
    }

    /// Makes `id` the central note.
    pub fn recenter(&mut self, id: &NoteId) -> GraphResult<()> {
        if self.store.get(id)?.is_none() {
            return Err(GraphServiceError::NoteNotFound(id.clone()));
        }
        self.set_center(id.clone())
    }

    /// Recenters on the designated home note, or the fallback chain.
    pub fn go_home(&mut self) -> GraphResult<()> {
        let home = self.fallback_center()?;
        self.set_center(home)
    }

    pub fn set_home(&mut self, id: &NoteId) -> GraphResult<()> {
        if self.store.get(id)?.is_none() {
            return Err(GraphServiceError::NoteNotFound(id.clone()));
        }
        save_note_pointer(&mut self.store, MetaKey::HomeNote, Some(id))?;
        Ok(())
    }

    /// Applies `kind` between `source` and each target.
    pub fn relate(
        &mut self,
        source: &NoteId,
        targets: &[NoteId],
        kind: RelationKind,
    ) -> GraphResult<RelationshipReport> {
        let report = set_relationship(&mut self.store, source, targets, kind)?;
        if !report.is_noop() {
            let mutation = match kind {
                RelationKind::Unlink => GraphMutation::Unlink,
                _ => GraphMutation::Link,
            };
            self.cache.note_mutation(mutation);
            self.refresh()?;
        }
        Ok(report)
    }

    /// Links existing notes to the center, as picked from search.
    pub fn link_existing(
        &mut self,
        targets: &[NoteId],
        kind: RelationKind,
    ) -> GraphResult<RelationshipReport> {
        let Some(center) = self.center_id().cloned() else {
            return Ok(RelationshipReport::default());
        };
        self.relate(&center, targets, kind)
    }

    /// Creates one note per `;`-separated title and links each to the center.
    ///
    /// # Errors
    /// `UnsupportedRelation` for `Unlink`, which would leave the new notes
    /// detached from everything.
    pub fn link_new_titles(&mut self, input: &str, kind: RelationKind) -> GraphResult<Vec<Note>> {
        if kind == RelationKind::Unlink {
            return Err(GraphServiceError::UnsupportedRelation(kind));
        }
        let Some(center) = self.center_id().cloned() else {
            return Ok(Vec::new());
        };
        let created: Vec<Note> = parse_new_titles(input).into_iter().map(Note::new).collect();
        if created.is_empty() {
            return Ok(created);
        }

        self.store.put_many(&created)?;
        let ids: Vec<NoteId> = created.iter().map(|note| note.id.clone()).collect();
        set_relationship(&mut self.store, &center, &ids, kind)?;
        self.cache.note_mutation(GraphMutation::CreateAsTarget);
        self.refresh()?;

        info!(
            "event=note_create module=service status=ok kind={} count={}",
            kind.as_str(),
            created.len()
        );
        Ok(created)
    }

    /// Creates a standalone note; the neighbourhood is unaffected.
    pub fn create_note(&mut self, title: &str) -> GraphResult<Note> {
        let note = Note::new(title_or_untitled(title));
        self.store.put(&note)?;
        info!("event=note_create module=service status=ok kind=standalone count=1");
        Ok(note)
    }

    pub fn rename_note(&mut self, id: &NoteId, title: &str) -> GraphResult<Note> {
        let mut note = self.get_note(id)?;
        let title = title_or_untitled(title);
        if note.title != title {
            note.title = title;
            note.touch();
            self.store.put(&note)?;
        }
        self.patch(&note, GraphMutation::Rename);
        Ok(note)
    }

    /// Replaces a note's body.
    pub fn edit_content(&mut self, id: &NoteId, content: &str) -> GraphResult<Note> {
        let mut note = self.get_note(id)?;
        if note.content != content {
            note.content = content.to_string();
            note.touch();
            self.store.put(&note)?;
        }
        self.patch(&note, GraphMutation::ContentEdit);
        Ok(note)
    }

    /// Flips a note's favorite flag; returns the new value.
    pub fn toggle_favorite(&mut self, id: &NoteId) -> GraphResult<bool> {
        let current = self.get_note(id)?;
        let note = self
            .store
            .set_favorite(id, !current.is_favorite)?
            .ok_or_else(|| GraphServiceError::NoteNotFound(id.clone()))?;
        self.patch(&note, GraphMutation::FavoriteToggle);
        self.reload_favorites()?;
        self.clamp();
        debug!(
            "event=favorite_toggle module=service status=ok favorite={}",
            note.is_favorite
        );
        Ok(note.is_favorite)
    }

    /// Deletes notes; edges pointing at them go with them.
    ///
    /// When the center is among them the session falls back to the home note,
    /// the first remaining note, or a freshly seeded one.
    ///
    /// Each delete commits on its own. If one fails, the notes removed before
    /// it are still reconciled into the session before the error is returned.
    pub fn delete_notes(&mut self, ids: &[NoteId]) -> GraphResult<usize> {
        let mut removed = Vec::with_capacity(ids.len());
        let mut failure = None;
        for id in ids {
            match self.store.delete(id) {
                Ok(true) => removed.push(id.clone()),
                Ok(false) => {}
                Err(err) => {
                    failure = Some(err);
                    break;
                }
            }
        }
        if removed.is_empty() {
            return failure.map_or(Ok(0), |err| Err(err.into()));
        }

        self.focus.forget(&removed);
        self.cache.note_mutation(GraphMutation::Delete);
        let center_removed = self
            .center_id()
            .is_some_and(|center| removed.contains(center));
        if center_removed {
            let next = self.fallback_center()?;
            self.set_center(next)?;
        } else {
            self.refresh()?;
        }

        if let Some(err) = failure {
            warn!(
                "event=note_delete module=service status=partial count={}",
                removed.len()
            );
            return Err(err.into());
        }
        info!(
            "event=note_delete module=service status=ok count={} center_removed={}",
            removed.len(),
            center_removed
        );
        Ok(removed.len())
    }

    pub fn update_settings(&mut self, settings: VaultSettings) -> GraphResult<()> {
        let settings = settings.normalized();
        save_settings(&mut self.store, &settings)?;
        self.cache.set_policy(settings.sort_policy);
        self.settings = settings;
        self.refresh()
    }

    pub fn export(&self) -> GraphResult<String> {
        Ok(export_json(&self.store)?)
    }

    /// Imports a JSON payload.
    ///
    /// Overwrite recenters on the first imported note; merge keeps the center.
    pub fn import(&mut self, payload: &str, mode: ImportMode) -> GraphResult<ImportReport> {
        let report = import_json(&mut self.store, payload, mode)?;
        self.cache.note_mutation(GraphMutation::Import);
        match mode {
            ImportMode::Overwrite => {
                self.focus = FocusState::new();
                let center = match &report.first_note {
                    Some(first) => first.clone(),
                    None => self.fallback_center()?,
                };
                self.set_center(center)?;
            }
            ImportMode::Merge => self.refresh()?,
        }
        Ok(report)
    }

    fn set_center(&mut self, id: NoteId) -> GraphResult<()> {
        save_note_pointer(&mut self.store, MetaKey::CentralNote, Some(&id))?;
        self.focus.refocus(Some(&id));
        self.cache.refocus(id);
        self.refresh()?;
        debug!("event=recenter module=service status=ok");
        Ok(())
    }

    fn fallback_center(&mut self) -> GraphResult<NoteId> {
        if let Some(home) = load_note_pointer(&self.store, MetaKey::HomeNote)? {
            if self.store.get(&home)?.is_some() {
                return Ok(home);
            }
        }
        if let Some(first) = self.store.first_note_id()? {
            return Ok(first);
        }

        let seed = Note::new(SEED_NOTE_TITLE);
        self.store.put(&seed)?;
        save_note_pointer(&mut self.store, MetaKey::HomeNote, Some(&seed.id))?;
        info!("event=seed_note module=service status=ok");
        Ok(seed.id)
    }

    fn patch(&mut self, note: &Note, mutation: GraphMutation) {
        if !self.cache.note_mutation(mutation) {
            self.cache.patch(note);
        }
        if let Some(cached) = self.favorites.iter_mut().find(|fav| fav.id == note.id) {
            *cached = note.clone();
            sort_notes(&mut self.favorites, self.settings.sort_policy);
        }
    }

    fn reload_favorites(&mut self) -> GraphResult<()> {
        let ids = load_favorites(&self.store)?;
        let mut favorites: Vec<Note> = self.store.batch_get(&ids)?.into_iter().flatten().collect();
        sort_notes(&mut favorites, self.settings.sort_policy);
        self.favorites = favorites;
        Ok(())
    }

    fn refresh(&mut self) -> GraphResult<()> {
        self.cache.get_or_compute(&self.store)?;
        self.reload_favorites()?;
        self.clamp();
        Ok(())
    }

    fn clamp(&mut self) {
        let ctx = NavContext::new(
            self.cache.peek(),
            &self.favorites,
            Visibility::from(&self.settings),
            &SingleColumn,
        );
        self.focus.clamp(&ctx);
    }
}

impl<S: NoteStore + SearchIndex> GraphService<S> {
    /// Ranked title search for pickers and quick-open.
    pub fn search_titles(&self, query: &str, limit: u32) -> GraphResult<Vec<TitleHit>> {
        Ok(self.store.search_titles(query, limit)?)
    }

    pub fn search_content(&self, query: &ContentQuery) -> GraphResult<Vec<ContentHit>> {
        Ok(self.store.search_content(query)?)
    }
}

fn title_or_untitled(raw: &str) -> String {
    let title = normalize_title(raw);
    if title.is_empty() {
        UNTITLED_NOTE_TITLE.to_string()
    } else {
        title
    }
}
