//! Gesture handling for a reconciliation screen.
//!
//! - [`SelectionController`]: click-to-select on either ledger, submitted as
//!   one multi-line match
//! - [`DragMatchController`]: drag a GL line onto a bank line to match the pair
//! - [`ReconcileSession`]: the command/event interface tying both to the match
//!   store, the projector and a gateway
//!
//! Failures never mutate the store. A successful multi-select submission clears
//! the selection; a failed one leaves it for a retry. Only one create call may
//! be in flight per session.
//!
//! [`SelectionController`]: selection::SelectionController
//! [`DragMatchController`]: drag::DragMatchController
//! [`ReconcileSession`]: reconcile::ReconcileSession

pub mod drag;
pub mod reconcile;
pub mod selection;
