//! Navigation automaton: `(state, event, context) -> (state, effect)`.
//!
//! # Responsibility
//! - Map directional input and commands to focus transitions.
//! - Describe structural commands as effects for the session to execute.
//!
//! # Invariants
//! - Pure: never touches storage, never panics on an empty topology.
//! - Moves toward empty, hidden or undefined targets leave focus unchanged.
//! - Lateral moves inside a wrapped section step by the layout stride and
//!   clamp at the section edge while another column remains.

use crate::graph::relationship::RelationKind;
use crate::model::note::NoteId;
use crate::nav::focus::FocusState;
use crate::nav::section::{Direction, NavContext, Section};

/// Input events understood by the automaton.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavEvent {
    /// Plain arrow key.
    Move(Direction),
    /// Shift + arrow: sticky range selection.
    Extend(Direction),
    /// Ctrl + arrow: link targets to the center in that direction.
    LinkAs(Direction),
    /// Space: make the focused note central.
    Open,
    /// Enter: focus the center.
    Return,
    ToggleSelectAdvance,
    ClearSelection,
    Unlink,
    Delete,
}

/// Structural work requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Recenter(NoteId),
    /// Apply `kind` between the center (source) and every target.
    Relate {
        kind: RelationKind,
        targets: Vec<NoteId>,
    },
    Delete(Vec<NoteId>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: FocusState,
    pub effect: Option<Effect>,
}

impl Transition {
    fn quiet(state: FocusState) -> Self {
        Self {
            state,
            effect: None,
        }
    }
}

/// Computes the next focus state and optional effect.
pub fn transition(state: &FocusState, event: NavEvent, ctx: &NavContext<'_>) -> Transition {
    let mut next = state.clone();
    next.clamp(ctx);

    match event {
        NavEvent::Move(direction) => {
            step(&mut next, direction, ctx);
            Transition::quiet(next)
        }
        NavEvent::Extend(direction) => {
            next.range_extend(direction, ctx);
            Transition::quiet(next)
        }
        NavEvent::Return => {
            next.goto(Section::Center, 0);
            Transition::quiet(next)
        }
        NavEvent::ClearSelection => {
            next.clear_selection();
            Transition::quiet(next)
        }
        NavEvent::Open => {
            let effect = next
                .focused_list_note(ctx)
                .filter(|note| Some(&note.id) != ctx.center_id())
                .map(|note| Effect::Recenter(note.id.clone()));
            Transition {
                state: next,
                effect,
            }
        }
        NavEvent::ToggleSelectAdvance => {
            if let Some(note) = next.focused_list_note(ctx) {
                next.toggle_select(&note.id, ctx.center_id());
                if next.index + 1 < ctx.len(next.focused) {
                    next.index += 1;
                }
            }
            Transition::quiet(next)
        }
        NavEvent::LinkAs(direction) => link_as(next, direction, ctx),
        NavEvent::Unlink => unlink(next, ctx),
        NavEvent::Delete => delete(next, ctx),
    }
}

fn link_as(mut state: FocusState, direction: Direction, ctx: &NavContext<'_>) -> Transition {
    let kind = match direction {
        Direction::Up => RelationKind::Parent,
        Direction::Down => RelationKind::Child,
        Direction::Left => RelationKind::Lateral,
        // Siblings are derived, there is no edge to create.
        Direction::Right => return Transition::quiet(state),
    };
    if ctx.center_id().is_none() {
        return Transition::quiet(state);
    }

    let targets = selection_or(&state, state.focused_list_note(ctx).map(|note| &note.id), ctx);
    if targets.is_empty() {
        return Transition::quiet(state);
    }
    state.clear_selection();
    Transition {
        state,
        effect: Some(Effect::Relate { kind, targets }),
    }
}

fn unlink(mut state: FocusState, ctx: &NavContext<'_>) -> Transition {
    if ctx.center_id().is_none() {
        return Transition::quiet(state);
    }
    let focused = if state.focused.is_direct_edge() {
        state.focused_list_note(ctx).map(|note| &note.id)
    } else {
        None
    };
    let targets = selection_or(&state, focused, ctx);
    if targets.is_empty() {
        return Transition::quiet(state);
    }
    state.clear_selection();
    Transition {
        state,
        effect: Some(Effect::Relate {
            kind: RelationKind::Unlink,
            targets,
        }),
    }
}

fn delete(mut state: FocusState, ctx: &NavContext<'_>) -> Transition {
    let targets = if state.selected.is_empty() {
        state
            .focused_note(ctx)
            .map(|note| vec![note.id.clone()])
            .unwrap_or_default()
    } else {
        state.selected.iter().cloned().collect()
    };
    if targets.is_empty() {
        return Transition::quiet(state);
    }
    state.clear_selection();
    Transition {
        state,
        effect: Some(Effect::Delete(targets)),
    }
}

/// Selected ids (minus the center), or the fallback when nothing is selected.
fn selection_or(
    state: &FocusState,
    fallback: Option<&NoteId>,
    ctx: &NavContext<'_>,
) -> Vec<NoteId> {
    let center = ctx.center_id();
    if state.selected.is_empty() {
        return fallback
            .filter(|id| Some(*id) != center)
            .cloned()
            .into_iter()
            .collect();
    }
    state
        .selected
        .iter()
        .filter(|id| Some(*id) != center)
        .cloned()
        .collect()
}

/// One directional move. Shared by plain moves and range extension.
pub(crate) fn step(state: &mut FocusState, direction: Direction, ctx: &NavContext<'_>) {
    match (state.focused, direction) {
        (Section::Center, Direction::Up) => {
            enter_first(state, ctx, &[Section::Up]);
        }
        (Section::Center, Direction::Down) => {
            enter_first(state, ctx, &[Section::Down]);
        }
        (Section::Center, Direction::Left) => {
            enter_first(state, ctx, &[Section::Left, Section::Favs]);
        }
        (Section::Center, Direction::Right) => {
            enter_first(state, ctx, &[Section::Right, Section::Content]);
        }
        (Section::Content, Direction::Up) => {
            enter_at_end(state, ctx, Section::Right);
        }
        (Section::Content, Direction::Left) => {
            enter_first(state, ctx, &[Section::Down, Section::Center]);
        }
        (Section::Content, Direction::Down | Direction::Right) => {}
        (section, Direction::Up | Direction::Down) => vertical(state, section, direction, ctx),
        (section, Direction::Left | Direction::Right) => {
            horizontal(state, section, direction, ctx)
        }
    }
}

fn vertical(state: &mut FocusState, section: Section, direction: Direction, ctx: &NavContext<'_>) {
    let len = ctx.len(section);
    if len == 0 {
        return;
    }

    if direction == Direction::Up {
        if state.index > 0 {
            state.index = (state.index - 1).min(len - 1);
            return;
        }
        match section {
            Section::Down => state.goto(Section::Center, 0),
            Section::Favs => enter_at_end(state, ctx, Section::Left),
            _ => {}
        }
        return;
    }

    if state.index + 1 < len {
        state.index += 1;
        return;
    }
    match section {
        Section::Up => state.goto(Section::Center, 0),
        Section::Left if ctx.is_available(Section::Favs) => state.goto(Section::Favs, 0),
        Section::Right if ctx.is_available(Section::Content) => state.goto(Section::Content, 0),
        _ => {}
    }
}

fn horizontal(
    state: &mut FocusState,
    section: Section,
    direction: Direction,
    ctx: &NavContext<'_>,
) {
    let len = ctx.len(section);
    if len == 0 {
        return;
    }
    let stride = ctx.stride(section);
    let index = state.index.min(len - 1);

    match direction {
        Direction::Right => {
            if let Some(target) = index.checked_add(stride).filter(|target| *target < len) {
                state.index = target;
                return;
            }
            if index / stride < (len - 1) / stride {
                state.index = len - 1;
                return;
            }
        }
        Direction::Left => {
            if index >= stride {
                state.index = index - stride;
                return;
            }
        }
        Direction::Up | Direction::Down => return,
    }

    let neighbours: &[Section] = match (section, direction) {
        (Section::Left, Direction::Right) => &[Section::Up, Section::Center],
        (Section::Favs, Direction::Right) => &[Section::Down, Section::Center],
        (Section::Up, Direction::Left) => &[Section::Left, Section::Favs],
        (Section::Up, Direction::Right) => &[Section::Right, Section::Content],
        (Section::Down, Direction::Left) => &[Section::Favs, Section::Left],
        (Section::Down, Direction::Right) => &[Section::Content, Section::Right],
        (Section::Right, Direction::Left) => &[Section::Up, Section::Center],
        _ => &[],
    };
    enter_first(state, ctx, neighbours);
}

/// Enters the first available candidate at its remembered index.
fn enter_first(state: &mut FocusState, ctx: &NavContext<'_>, candidates: &[Section]) -> bool {
    let Some(section) = candidates
        .iter()
        .copied()
        .find(|candidate| ctx.is_available(*candidate))
    else {
        return false;
    };
    let index = state.remembered_index(section, ctx.len(section));
    state.goto(section, index);
    true
}

fn enter_at_end(state: &mut FocusState, ctx: &NavContext<'_>, section: Section) {
    if ctx.is_available(section) {
        state.goto(section, ctx.len(section).saturating_sub(1));
    }
}
