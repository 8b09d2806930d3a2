//! Server calls for creating and deleting matches.
//!
//! Every answer is normalized into one of three kinds before it reaches the
//! session:
//!
//! | Answer                                          | Outcome            |
//! |-------------------------------------------------|--------------------|
//! | `{ok: true, match_id, bank_lines, gl_lines}`    | success            |
//! | `{error: "amount_mismatch", bank_amount, ...}`  | business rejection |
//! | `{error: "already_matched", kind: "bank"/"gl"}` | business rejection |
//! | anything else, HTTP failure, network error      | transport failure  |
//!
//! Business rejections are recognized even on non-2xx statuses because the
//! server reports them with 400.
//!
//! ## Endpoints
//!
//! ```text
//! POST {server}/reconcile/{session}/match/     create
//! POST {server}/reconcile/{session}/unmatch/   delete
//! ```

pub mod client;
pub mod config;
pub mod wire;
