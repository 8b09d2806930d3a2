use serde::Serialize;
use std::collections::BTreeSet;

use crate::core::types::{LineRef, MatchId, Side};
use crate::gateway::client::MatchGateway;
use crate::gateway::wire::{
    CreateMatchRequest, CreateOutcome, DeleteOutcome, MatchCreated, Rejection, RequestForm,
    TransportFailure,
};
use crate::graph::snapshot::{ingest, IngestReport, SnapshotError};
use crate::graph::store::MatchStore;
use crate::session::drag::DragMatchController;
use crate::session::selection::SelectionController;
use crate::ui::board::LineBoard;
use crate::ui::projector::Projector;

/// Result of one user gesture
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// The server confirmed a match and the store absorbed it
    Matched(MatchCreated),
    /// The server declined the match
    Rejected(Rejection),
    /// A create call produced no usable answer
    CreateFailed(TransportFailure),
    /// A delete call produced no usable answer
    UnmatchFailed(TransportFailure),
    /// Submission without a selection on both sides; nothing was sent
    SelectionIncomplete,
    /// A create call is still in flight; nothing was sent
    Busy,
    /// Malformed local input, nothing happened
    Ignored,
    /// The match was deleted; the session must be rebuilt from a fresh snapshot
    ReloadRequired,
}

impl Outcome {
    /// Message to show the operator, `None` for outcomes that need none
    pub fn message(&self) -> Option<String> {
        match self {
            Self::Matched(_) | Self::Busy | Self::Ignored | Self::ReloadRequired => None,
            Self::SelectionIncomplete => {
                Some("Select at least one bank line and at least one GL line".to_string())
            }
            Self::Rejected(Rejection::AmountMismatch {
                bank_amount,
                gl_amount,
            }) => Some(format!(
                "Amounts do not match:\nBank: {bank_amount}\nGL: {gl_amount}"
            )),
            Self::Rejected(Rejection::AlreadyMatched { side, .. }) => {
                let what = match side {
                    Side::Bank => "Bank line",
                    Side::Gl => "GL line",
                };
                Some(format!(
                    "{what} is already reconciled and cannot be matched again."
                ))
            }
            Self::CreateFailed(_) => Some("Technical error: could not create match".to_string()),
            Self::UnmatchFailed(_) => Some("Technical error: could not remove match".to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Matched(_) | Self::ReloadRequired)
    }
}

/// One reconciliation screen: the match store plus every controller acting on it.
///
/// Each `on_*` method is a synchronous transition. Network calls are split into
/// a `begin_*` step that yields the request and [`Self::on_match_response`]
/// that folds the answer in; [`Self::submit_selection`] and
/// [`Self::drop_and_match`] chain the two around a [`MatchGateway`].
#[derive(Debug, Default)]
pub struct ReconcileSession {
    store: MatchStore,
    projector: Projector,
    selection: SelectionController,
    drag: DragMatchController,
    /// Create call awaiting its answer; further creates are refused meanwhile
    in_flight: Option<CreateMatchRequest>,
    reload_required: bool,
}

impl ReconcileSession {
    /// Start a session over an already populated store and paint it
    pub fn from_store(store: MatchStore) -> Self {
        let mut projector = Projector::new();
        let painted = projector.paint_all(&store);
        tracing::debug!(groups = store.len(), painted, "Session started");
        Self {
            store,
            projector,
            ..Self::default()
        }
    }

    /// Start a session from snapshot text
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot is not a JSON object.
    pub fn from_snapshot(text: &str) -> Result<(Self, IngestReport), SnapshotError> {
        let mut store = MatchStore::new();
        let report = ingest(&mut store, text)?;
        Ok((Self::from_store(store), report))
    }

    pub fn store(&self) -> &MatchStore {
        &self.store
    }

    pub fn board(&self) -> &LineBoard {
        self.projector.board()
    }

    pub fn selection(&self) -> &SelectionController {
        &self.selection
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Set once a delete succeeds; the caller should discard this session
    pub fn reload_required(&self) -> bool {
        self.reload_required
    }

    pub fn on_line_selected(&mut self, line: &LineRef) -> bool {
        self.selection.toggle(line, self.projector.board_mut())
    }

    pub fn on_hover(&mut self, line: &LineRef) -> BTreeSet<LineRef> {
        self.projector.highlight_group(&self.store, line)
    }

    pub fn on_hover_end(&mut self) {
        self.projector.clear_highlight();
    }

    pub fn on_drag_start(&mut self, line: &LineRef) -> Option<String> {
        self.drag.drag_start(line, self.projector.board_mut())
    }

    pub fn on_drag_end(&mut self) {
        self.drag.drag_end(self.projector.board_mut());
    }

    pub fn on_drag_over(&mut self, target: &LineRef) -> bool {
        self.drag.drag_over(target, self.projector.board_mut())
    }

    pub fn on_drag_leave(&mut self, target: &LineRef) {
        self.drag.drag_leave(target, self.projector.board_mut());
    }

    fn claim(&mut self, request: CreateMatchRequest) -> Result<CreateMatchRequest, Outcome> {
        if self.in_flight.is_some() {
            tracing::debug!("Create already in flight, refusing another");
            return Err(Outcome::Busy);
        }
        self.in_flight = Some(request.clone());
        Ok(request)
    }

    /// Validate the selection and claim the in-flight slot
    ///
    /// # Errors
    ///
    /// Returns `Outcome::SelectionIncomplete` or `Outcome::Busy`; no request
    /// may be sent in either case.
    pub fn begin_submit(&mut self) -> Result<CreateMatchRequest, Outcome> {
        let request = self.selection.request().ok_or(Outcome::SelectionIncomplete)?;
        self.claim(request)
    }

    /// Resolve a drop and claim the in-flight slot
    ///
    /// # Errors
    ///
    /// Returns `Outcome::Ignored` for malformed drops or `Outcome::Busy`.
    pub fn on_drag_drop(
        &mut self,
        target: &LineRef,
        payload: Option<&str>,
    ) -> Result<CreateMatchRequest, Outcome> {
        let request = self
            .drag
            .drop(target, payload, self.projector.board_mut())
            .ok_or(Outcome::Ignored)?;
        self.claim(request)
    }

    /// Fold a create-match answer into the session.
    ///
    /// Only a success touches the store, and it uses the member lists from the
    /// answer. A successful multi-select submission clears the selection; any
    /// failure leaves it for a retry.
    pub fn on_match_response(
        &mut self,
        request: &CreateMatchRequest,
        outcome: CreateOutcome,
    ) -> Outcome {
        self.in_flight = None;
        match outcome {
            CreateOutcome::Success(created) => {
                self.store
                    .add_members(&created.match_id, &created.bank_lines, &created.gl_lines);
                self.projector.paint_group(&self.store, &created.match_id);
                if request.form == RequestForm::Multi {
                    self.selection.clear(self.projector.board_mut());
                }
                tracing::info!(
                    match_id = %created.match_id,
                    bank = created.bank_lines.len(),
                    gl = created.gl_lines.len(),
                    "Match confirmed"
                );
                Outcome::Matched(created)
            }
            CreateOutcome::Rejected(rejection) => {
                tracing::warn!(?rejection, "Match rejected by server");
                Outcome::Rejected(rejection)
            }
            CreateOutcome::TransportFailure(failure) => {
                tracing::warn!(%failure, "Match request failed");
                Outcome::CreateFailed(failure)
            }
        }
    }

    /// Submit the current selection as one match
    pub async fn submit_selection<G: MatchGateway>(&mut self, gateway: &G) -> Outcome {
        match self.begin_submit() {
            Ok(request) => {
                let answer = gateway.create_match(&request).await;
                self.on_match_response(&request, answer)
            }
            Err(outcome) => outcome,
        }
    }

    /// Handle a drop end to end
    pub async fn drop_and_match<G: MatchGateway>(
        &mut self,
        gateway: &G,
        target: &LineRef,
        payload: Option<&str>,
    ) -> Outcome {
        match self.on_drag_drop(target, payload) {
            Ok(request) => {
                let answer = gateway.create_match(&request).await;
                self.on_match_response(&request, answer)
            }
            Err(outcome) => outcome,
        }
    }

    /// Fold a delete-match answer in. The store is never edited here: a
    /// successful delete only flags the session for reload.
    pub fn on_unmatch_response(&mut self, outcome: DeleteOutcome) -> Outcome {
        match outcome {
            DeleteOutcome::Deleted => {
                self.reload_required = true;
                tracing::info!("Match deleted, reload required");
                Outcome::ReloadRequired
            }
            DeleteOutcome::TransportFailure(failure) => {
                tracing::warn!(%failure, "Unmatch request failed");
                Outcome::UnmatchFailed(failure)
            }
        }
    }

    /// Delete a match through the gateway
    pub async fn unmatch<G: MatchGateway>(&mut self, gateway: &G, match_id: &MatchId) -> Outcome {
        let answer = gateway.delete_match(match_id).await;
        self.on_unmatch_response(answer)
    }
}
