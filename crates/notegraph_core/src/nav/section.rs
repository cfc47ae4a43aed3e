//! Section identifiers and the read-only context navigation runs against.

use crate::graph::topology::Topology;
use crate::model::note::{Note, NoteId};
use crate::model::settings::VaultSettings;
use crate::nav::layout::ColumnLayout;

/// Closed set of focusable regions around the central note.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Section {
    #[default]
    Center,
    Up,
    Down,
    Left,
    Right,
    Favs,
    /// Content/preview pane of the central note. Has no items.
    Content,
}

impl Section {
    /// Sections holding an indexable list of notes.
    pub fn is_list(self) -> bool {
        matches!(
            self,
            Self::Up | Self::Down | Self::Left | Self::Right | Self::Favs
        )
    }

    /// Sections whose notes hold a direct edge with the center.
    pub fn is_direct_edge(self) -> bool {
        matches!(self, Self::Up | Self::Down | Self::Left)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Center => "center",
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
            Self::Favs => "favs",
            Self::Content => "content",
        }
    }

    /// Extractor table: the notes a section shows for the given context.
    pub fn notes<'a>(self, ctx: &NavContext<'a>) -> &'a [Note] {
        let topology = ctx.topology;
        match self {
            Self::Center => topology
                .center
                .as_ref()
                .map_or(&[][..], std::slice::from_ref),
            Self::Up => &topology.uppers,
            Self::Down => &topology.downers,
            Self::Left => &topology.lefters,
            Self::Right => &topology.righters,
            Self::Favs => ctx.favorites,
            Self::Content => &[],
        }
    }
}

/// Arrow direction of a navigation input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Presentation toggles that hide optional sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Visibility {
    pub favorites: bool,
    pub content: bool,
}

impl Default for Visibility {
    fn default() -> Self {
        Self {
            favorites: true,
            content: true,
        }
    }
}

impl From<&VaultSettings> for Visibility {
    fn from(settings: &VaultSettings) -> Self {
        Self {
            favorites: settings.show_favorites,
            content: settings.show_content,
        }
    }
}

/// Everything the automaton reads besides the focus state itself.
#[derive(Clone, Copy)]
pub struct NavContext<'a> {
    pub topology: &'a Topology,
    pub favorites: &'a [Note],
    pub visibility: Visibility,
    pub layout: &'a dyn ColumnLayout,
}

impl<'a> NavContext<'a> {
    pub fn new(
        topology: &'a Topology,
        favorites: &'a [Note],
        visibility: Visibility,
        layout: &'a dyn ColumnLayout,
    ) -> Self {
        Self {
            topology,
            favorites,
            visibility,
            layout,
        }
    }

    pub fn center_id(&self) -> Option<&'a NoteId> {
        self.topology.center.as_ref().map(|note| &note.id)
    }

    pub fn len(&self, section: Section) -> usize {
        section.notes(self).len()
    }

    pub fn note_at(&self, section: Section, index: usize) -> Option<&'a Note> {
        section.notes(self).get(index)
    }

    /// Whether the section is rendered at all under current settings.
    pub fn is_visible(&self, section: Section) -> bool {
        match section {
            Section::Favs => self.visibility.favorites,
            Section::Content => self.visibility.content && self.topology.center.is_some(),
            _ => true,
        }
    }

    /// Whether focus may rest on the section: visible, and non-empty for lists.
    pub fn is_available(&self, section: Section) -> bool {
        match section {
            Section::Center => true,
            Section::Content => self.is_visible(section),
            list => self.is_visible(list) && self.len(list) > 0,
        }
    }

    /// Horizontal stride inside a wrapped section, never below one.
    pub fn stride(&self, section: Section) -> usize {
        self.layout.items_per_column(section).max(1)
    }
}
