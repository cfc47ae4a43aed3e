//! Selection and focus model.
//!
//! # Responsibility
//! - Track the focused section/index, the multi-selection and the index each
//!   list section should restore when re-entered.
//! - Restore focus invariants after topology or visibility changes.
//!
//! # Invariants
//! - `selected` never contains the central note.
//! - After `clamp`, focus rests on an available section and `index` is in
//!   bounds for list sections (and `0` otherwise).

use crate::model::note::{Note, NoteId};
use crate::nav::automaton::step;
use crate::nav::section::{Direction, NavContext, Section};
use std::collections::{BTreeMap, BTreeSet};

/// Session-scoped focus state. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FocusState {
    pub focused: Section,
    pub index: usize,
    pub selected: BTreeSet<NoteId>,
    pub remembered: BTreeMap<Section, usize>,
}

impl FocusState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The note under the cursor, including the center itself.
    pub fn focused_note<'a>(&self, ctx: &NavContext<'a>) -> Option<&'a Note> {
        match self.focused {
            Section::Content => None,
            Section::Center => ctx.note_at(Section::Center, 0),
            list => ctx.note_at(list, self.index),
        }
    }

    /// The note under the cursor when focus is inside a list section.
    pub fn focused_list_note<'a>(&self, ctx: &NavContext<'a>) -> Option<&'a Note> {
        if self.focused.is_list() {
            ctx.note_at(self.focused, self.index)
        } else {
            None
        }
    }

    pub fn is_selected(&self, id: &NoteId) -> bool {
        self.selected.contains(id)
    }

    /// Flips selection of `id`; the center can never be selected.
    ///
    /// Returns whether the selection changed.
    pub fn toggle_select(&mut self, id: &NoteId, center: Option<&NoteId>) -> bool {
        if center == Some(id) {
            return false;
        }
        if !self.selected.remove(id) {
            self.selected.insert(id.clone());
        }
        true
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    /// Shift-style selection growth: seed with the focused item when nothing
    /// is selected, move one step, then add the newly focused item.
    ///
    /// Previously selected items are never removed.
    pub fn range_extend(&mut self, direction: Direction, ctx: &NavContext<'_>) {
        let center = ctx.center_id();
        if self.selected.is_empty() {
            if let Some(note) = self.focused_list_note(ctx) {
                if Some(&note.id) != center {
                    self.selected.insert(note.id.clone());
                }
            }
        }

        step(self, direction, ctx);

        if let Some(note) = self.focused_list_note(ctx) {
            if Some(&note.id) != center {
                self.selected.insert(note.id.clone());
            }
        }
    }

    /// Index a list section should show when entered, clamped to `len`.
    pub fn remembered_index(&self, section: Section, len: usize) -> usize {
        let remembered = self.remembered.get(&section).copied().unwrap_or(0);
        remembered.min(len.saturating_sub(1))
    }

    /// Moves focus, recording the index of the list section being left.
    pub fn goto(&mut self, section: Section, index: usize) {
        if self.focused.is_list() && self.focused != section {
            self.remembered.insert(self.focused, self.index);
        }
        self.focused = section;
        self.index = if section.is_list() { index } else { 0 };
    }

    /// Restores focus invariants against a new topology or visibility.
    pub fn clamp(&mut self, ctx: &NavContext<'_>) {
        if let Some(center) = ctx.center_id() {
            self.selected.remove(center);
        }

        let target = fallback_section(self.focused, ctx);
        if target != self.focused {
            let index = self.remembered_index(target, ctx.len(target));
            self.goto(target, index);
        }

        self.index = if self.focused.is_list() {
            self.index.min(ctx.len(self.focused).saturating_sub(1))
        } else {
            0
        };
    }

    /// Resets focus for a new central note.
    ///
    /// Remembered indices are dropped; the selection survives, minus the new
    /// center.
    pub fn refocus(&mut self, new_center: Option<&NoteId>) {
        self.focused = Section::Center;
        self.index = 0;
        self.remembered.clear();
        if let Some(center) = new_center {
            self.selected.remove(center);
        }
    }

    /// Drops selected ids that no longer exist.
    pub fn forget(&mut self, removed: &[NoteId]) {
        for id in removed {
            self.selected.remove(id);
        }
    }
}

fn fallback_section(section: Section, ctx: &NavContext<'_>) -> Section {
    if ctx.is_available(section) {
        return section;
    }
    let chain: &[Section] = match section {
        Section::Favs => &[Section::Left],
        Section::Content => &[Section::Right],
        _ => &[],
    };
    chain
        .iter()
        .copied()
        .find(|candidate| ctx.is_available(*candidate))
        .unwrap_or(Section::Center)
}
