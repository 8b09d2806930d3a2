use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::core::types::{LineRef, MatchId};

/// Visual state applied to a rendered line
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Decoration {
    /// Persistent: the line belongs to at least one confirmed match (shown with a tick)
    Matched,
    /// The line is part of the current multi-select
    Selected,
    /// Transient: shares a match group with the hovered line
    Paired,
    /// Transient: the line is being dragged
    Dragging,
    /// Transient: a drag is hovering over this drop target
    DragOver,
}

impl Decoration {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Matched => "matched",
            Self::Selected => "selected",
            Self::Paired => "paired",
            Self::Dragging => "dragging",
            Self::DragOver => "drag-over",
        }
    }
}

/// Reconciliation state of one line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LineState {
    Unmatched,
    Matched,
}

/// Render model of one line
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LineView {
    pub decorations: BTreeSet<Decoration>,

    /// Every match this line was recorded under, in arrival order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub match_ids: Vec<MatchId>,
}

impl LineView {
    pub fn state(&self) -> LineState {
        if self.decorations.contains(&Decoration::Matched) {
            LineState::Matched
        } else {
            LineState::Unmatched
        }
    }
}

/// Toolkit-independent representation of every rendered line.
///
/// Lines enter the board the first time they are decorated; a line never seen
/// reads as undecorated and unmatched.
#[derive(Debug, Clone, Default)]
pub struct LineBoard {
    lines: BTreeMap<LineRef, LineView>,
}

impl LineBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a decoration, returns true if the line did not have it yet
    pub fn decorate(&mut self, line: &LineRef, decoration: Decoration) -> bool {
        self.lines
            .entry(line.clone())
            .or_default()
            .decorations
            .insert(decoration)
    }

    /// Remove a decoration, returns true if the line had it
    pub fn undecorate(&mut self, line: &LineRef, decoration: Decoration) -> bool {
        self.lines
            .get_mut(line)
            .is_some_and(|view| view.decorations.remove(&decoration))
    }

    /// Remove a decoration from every line carrying it, returns those lines
    pub fn clear_decoration(&mut self, decoration: Decoration) -> Vec<LineRef> {
        let mut cleared = Vec::new();
        for (line, view) in &mut self.lines {
            if view.decorations.remove(&decoration) {
                cleared.push(line.clone());
            }
        }
        cleared
    }

    pub fn has(&self, line: &LineRef, decoration: Decoration) -> bool {
        self.lines
            .get(line)
            .is_some_and(|view| view.decorations.contains(&decoration))
    }

    /// Append a match id to the line's record unless already present
    pub fn record_match_id(&mut self, line: &LineRef, match_id: &MatchId) -> bool {
        let view = self.lines.entry(line.clone()).or_default();
        if view.match_ids.contains(match_id) {
            false
        } else {
            view.match_ids.push(match_id.clone());
            true
        }
    }

    pub fn view(&self, line: &LineRef) -> Option<&LineView> {
        self.lines.get(line)
    }

    pub fn state(&self, line: &LineRef) -> LineState {
        self.view(line).map_or(LineState::Unmatched, LineView::state)
    }

    /// Lines currently carrying `decoration`, in stable order
    pub fn lines_with(&self, decoration: Decoration) -> BTreeSet<LineRef> {
        self.lines
            .iter()
            .filter(|(_, view)| view.decorations.contains(&decoration))
            .map(|(line, _)| line.clone())
            .collect()
    }

    /// All lines the board has seen
    pub fn iter(&self) -> impl Iterator<Item = (&LineRef, &LineView)> {
        self.lines.iter()
    }
}
