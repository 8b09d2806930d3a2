use std::collections::BTreeSet;

use crate::core::types::{LineRef, MatchId};
use crate::graph::store::MatchStore;
use crate::ui::board::{Decoration, LineBoard};

/// Projects match-store state onto the line board.
///
/// "Matched" decoration is persistent and only ever added; "paired" highlight
/// is transient and always cleared as a whole.
#[derive(Debug, Default)]
pub struct Projector {
    board: LineBoard,
}

impl Projector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn board(&self) -> &LineBoard {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut LineBoard {
        &mut self.board
    }

    /// Mark a line matched and record `match_id` on it. Repeating the call
    /// changes nothing.
    pub fn mark_matched(&mut self, line: &LineRef, match_id: &MatchId) {
        self.board.decorate(line, Decoration::Matched);
        self.board.record_match_id(line, match_id);
    }

    /// Paint every member of one group
    pub fn paint_group(&mut self, store: &MatchStore, match_id: &MatchId) -> usize {
        let Some(group) = store.group(match_id) else {
            return 0;
        };
        let mut painted = 0;
        for line in group.members() {
            self.mark_matched(&line, match_id);
            painted += 1;
        }
        painted
    }

    /// Paint every group in the store, used once after ingestion
    pub fn paint_all(&mut self, store: &MatchStore) -> usize {
        let ids: Vec<MatchId> = store.groups().map(|g| g.id.clone()).collect();
        ids.iter().map(|id| self.paint_group(store, id)).sum()
    }

    /// Highlight every line sharing any group with `line`.
    ///
    /// Any previous highlight is cleared first. Returns the highlighted set,
    /// empty when the line is unmatched.
    pub fn highlight_group(&mut self, store: &MatchStore, line: &LineRef) -> BTreeSet<LineRef> {
        self.clear_highlight();
        let paired = store.paired_lines(line);
        for member in &paired {
            self.board.decorate(member, Decoration::Paired);
        }
        paired
    }

    /// Remove the paired highlight from every line carrying it
    pub fn clear_highlight(&mut self) {
        self.board.clear_decoration(Decoration::Paired);
    }

    pub fn highlighted(&self) -> BTreeSet<LineRef> {
        self.board.lines_with(Decoration::Paired)
    }
}
