//! # bankrec
//!
//! Client-side match-graph manager for bank reconciliation.
//!
//! Reconciling a bank account means linking lines from an external bank
//! statement to postings in the general ledger. A link (a *match group*) can be
//! 1-to-1, 1-to-many or many-to-many, and the server is the only authority on
//! which groups exist.
//!
//! `bankrec` keeps a local, always-consistent view of those groups:
//!
//! - **Bidirectional index**: match → lines and line → matches, updated together
//! - **Two snapshot shapes**: legacy pair rows and grouped rows, merged by union
//! - **Confirmed updates only**: the store grows from server answers, never from guesses
//! - **Highlighting**: hovering a line lights up every line sharing any group with it
//!
//! ## Example
//!
//! ```rust
//! use bankrec::session::reconcile::ReconcileSession;
//! use bankrec::core::types::LineRef;
//!
//! let snapshot = r#"{"matches": [{"match_id": 1, "bank_ids": [10, 11], "gl_ids": [20]}]}"#;
//! let (mut session, _report) = ReconcileSession::from_snapshot(snapshot).unwrap();
//!
//! let paired = session.on_hover(&LineRef::gl("20"));
//! assert_eq!(paired.len(), 3);
//! ```
//!
//! ## Modules
//!
//! - [`core`]: Identifier types for lines, sides and matches
//! - [`graph`]: Match store and snapshot ingestion
//! - [`session`]: Selection, drag-and-drop and the session event interface
//! - [`gateway`]: Create/delete calls and response normalization
//! - [`ui`]: Line decoration and highlighting
//! - [`cli`]: Command-line interface implementation

pub mod cli;
pub mod core;
pub mod gateway;
pub mod graph;
pub mod session;
pub mod ui;
pub mod utils;

// Re-export commonly used types for convenience
pub use crate::core::types::*;
pub use crate::gateway::client::{HttpGateway, MatchGateway};
pub use crate::graph::store::{MatchGroup, MatchStore};
pub use crate::session::reconcile::{Outcome, ReconcileSession};
