use serde::{Deserialize, Serialize};

use crate::core::types::{LineId, LineRef, Side};
use crate::gateway::wire::CreateMatchRequest;
use crate::ui::board::{Decoration, LineBoard};

/// Data carried by a drag: exactly the source GL line id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragPayload {
    pub gl_line_id: LineId,
}

impl DragPayload {
    /// Parse a drop payload; anything unexpected yields `None`
    pub fn parse(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }
}

/// Single-pair matching by dragging a GL line onto a bank line
#[derive(Debug, Default)]
pub struct DragMatchController {
    source: Option<LineRef>,
}

impl DragMatchController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start dragging. Only GL lines are draggable; returns the payload text
    /// to attach to the drag.
    pub fn drag_start(&mut self, line: &LineRef, board: &mut LineBoard) -> Option<String> {
        if line.side != Side::Gl {
            return None;
        }
        let payload = DragPayload {
            gl_line_id: line.id.clone(),
        };
        let text = serde_json::to_string(&payload).ok()?;
        board.decorate(line, Decoration::Dragging);
        self.source = Some(line.clone());
        Some(text)
    }

    pub fn drag_end(&mut self, board: &mut LineBoard) {
        if let Some(source) = self.source.take() {
            board.undecorate(&source, Decoration::Dragging);
        }
    }

    /// A drag entered a line; only bank lines accept drops
    pub fn drag_over(&self, target: &LineRef, board: &mut LineBoard) -> bool {
        if target.side != Side::Bank {
            return false;
        }
        board.decorate(target, Decoration::DragOver);
        true
    }

    pub fn drag_leave(&self, target: &LineRef, board: &mut LineBoard) {
        board.undecorate(target, Decoration::DragOver);
    }

    /// Resolve a drop into a single-pair request.
    ///
    /// Drops on non-bank lines, missing payloads, and payloads that are not
    /// `{"gl_line_id": ...}` are ignored.
    pub fn drop(
        &mut self,
        target: &LineRef,
        payload: Option<&str>,
        board: &mut LineBoard,
    ) -> Option<CreateMatchRequest> {
        board.undecorate(target, Decoration::DragOver);
        if target.side != Side::Bank {
            return None;
        }
        let payload = DragPayload::parse(payload.unwrap_or("{}"))?;
        Some(CreateMatchRequest::single(
            target.id.clone(),
            payload.gl_line_id,
        ))
    }
}
