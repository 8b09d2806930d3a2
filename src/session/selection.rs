use std::collections::BTreeSet;

use crate::core::types::{LineId, LineRef, Side};
use crate::gateway::wire::CreateMatchRequest;
use crate::ui::board::{Decoration, LineBoard};

/// Multi-select state for both ledgers.
///
/// Every mutation updates the id sets and the "selected" decoration together,
/// so the board never shows a selection the model does not hold.
#[derive(Debug, Default)]
pub struct SelectionController {
    bank: BTreeSet<LineId>,
    gl: BTreeSet<LineId>,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    fn set_mut(&mut self, side: Side) -> &mut BTreeSet<LineId> {
        match side {
            Side::Bank => &mut self.bank,
            Side::Gl => &mut self.gl,
        }
    }

    /// Flip a line in or out of the selection. Returns true if it is now selected.
    pub fn toggle(&mut self, line: &LineRef, board: &mut LineBoard) -> bool {
        let set = self.set_mut(line.side);
        if set.remove(&line.id) {
            board.undecorate(line, Decoration::Selected);
            false
        } else {
            set.insert(line.id.clone());
            board.decorate(line, Decoration::Selected);
            true
        }
    }

    pub fn selected(&self, side: Side) -> &BTreeSet<LineId> {
        match side {
            Side::Bank => &self.bank,
            Side::Gl => &self.gl,
        }
    }

    pub fn is_selected(&self, line: &LineRef) -> bool {
        self.selected(line.side).contains(&line.id)
    }

    /// The multi-select request, or `None` unless both sides have a selection
    pub fn request(&self) -> Option<CreateMatchRequest> {
        if self.bank.is_empty() || self.gl.is_empty() {
            return None;
        }
        Some(CreateMatchRequest::multi(
            self.bank.iter().cloned().collect(),
            self.gl.iter().cloned().collect(),
        ))
    }

    /// Drop both selections and their decorations
    pub fn clear(&mut self, board: &mut LineBoard) {
        for side in [Side::Bank, Side::Gl] {
            for id in std::mem::take(self.set_mut(side)) {
                board.undecorate(&LineRef::new(side, id), Decoration::Selected);
            }
        }
    }
}
