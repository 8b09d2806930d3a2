//! Match-graph storage and snapshot ingestion.
//!
//! The [`MatchStore`] is a bidirectional many-to-many index between match
//! groups and the bank/GL lines they contain. It is populated once from the
//! page snapshot and afterwards only grows, as the server confirms new matches.
//!
//! ## Snapshot Shapes
//!
//! Two historical wire shapes are accepted, alone or together:
//!
//! ```text
//! { "pairs":   [{"match_id": 1, "bank_id": 10, "gl_id": 20}, ...] }
//! { "matches": [{"match_id": 1, "bank_ids": [10], "gl_ids": [20]}, ...] }
//! ```
//!
//! Both are normalized into [`NormalizedSnapshot`] rows before the store is
//! touched. A match id appearing in both shapes merges into one group holding
//! the union of members.
//!
//! ## Example
//!
//! ```rust
//! use bankrec::graph::snapshot::ingest;
//! use bankrec::graph::store::MatchStore;
//! use bankrec::core::types::{LineId, MatchId};
//!
//! let mut store = MatchStore::new();
//! ingest(&mut store, r#"{"pairs": [{"match_id": 1, "bank_id": 10, "gl_id": 20}]}"#).unwrap();
//!
//! assert!(store.bank_matches(&LineId::new("10")).contains(&MatchId::new("1")));
//! ```
//!
//! [`MatchStore`]: store::MatchStore
//! [`NormalizedSnapshot`]: snapshot::NormalizedSnapshot

pub mod snapshot;
pub mod store;
