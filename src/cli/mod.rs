//! Command-line interface for bankrec.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **inspect**: Load a snapshot and show every match group
//! - **paired**: Show which lines share a match group with a given line
//! - **match**: Ask the server to match bank lines with GL lines
//! - **unmatch**: Ask the server to delete a match
//! - **replay**: Drive a reconciliation session from a script of events
//!
//! ## Usage
//!
//! ```text
//! # Inspect the snapshot embedded in a reconciliation page
//! bankrec inspect matches.json
//!
//! # Which lines light up when hovering GL line 20?
//! bankrec paired matches.json --gl 20
//!
//! # Match two bank lines against one GL line
//! bankrec match --server https://books.example --session 4 --bank 10 --bank 11 --gl 20
//!
//! # Remove a match without prompting
//! bankrec unmatch 17 --yes --server https://books.example --session 4
//! ```

use std::io::Read;
use std::path::Path;

use clap::{Parser, Subcommand};

use crate::core::types::{LineId, LineRef, Side};
use crate::gateway::client::{HttpGateway, MatchGateway};
use crate::gateway::config::{GatewayConfig, GatewayError};
use crate::graph::snapshot::{self, IngestReport};
use crate::graph::store::MatchStore;
use crate::session::reconcile::{Outcome, ReconcileSession};
use crate::utils::validation::{check_snapshot_size, MAX_SNAPSHOT_BYTES};

pub mod create;
pub mod inspect;
pub mod paired;
pub mod replay;
pub mod unmatch;

#[derive(Parser)]
#[command(name = "bankrec")]
#[command(version)]
#[command(about = "Inspect and edit bank reconciliation matches")]
#[command(
    long_about = "bankrec keeps a local view of the match groups linking bank statement lines to general-ledger postings.\n\nIt reads the match snapshot a reconciliation page is built from and talks to the reconciliation server to:\n- Show every match group and check the index is consistent\n- Show which lines are paired with a given line\n- Create and delete matches"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show every match group in a snapshot
    Inspect(inspect::InspectArgs),

    /// Show the lines paired with one line
    Paired(paired::PairedArgs),

    /// Create a match on the server
    Match(create::MatchArgs),

    /// Delete a match on the server
    Unmatch(unmatch::UnmatchArgs),

    /// Replay a script of gestures against a session
    Replay(replay::ReplayArgs),
}

/// Where the reconciliation server lives
#[derive(clap::Args, Debug, Clone, Default)]
pub struct GatewayArgs {
    /// Server root URL
    #[arg(long, env = "BANKREC_SERVER")]
    pub server: Option<String>,

    /// Reconciliation session ID on the server
    #[arg(long, env = "BANKREC_SESSION")]
    pub session: Option<u64>,

    /// Explicit create-match endpoint (overrides --server/--session)
    #[arg(long)]
    pub match_url: Option<String>,

    /// Explicit delete-match endpoint (overrides --server/--session)
    #[arg(long)]
    pub unmatch_url: Option<String>,

    /// Anti-forgery token sent with every call
    #[arg(long, env = "BANKREC_CSRF_TOKEN", hide_env_values = true)]
    pub csrf_token: Option<String>,
}

impl GatewayArgs {
    /// # Errors
    ///
    /// Returns an error if an endpoint is missing or invalid.
    pub fn config(&self) -> Result<GatewayConfig, GatewayError> {
        Ok(GatewayConfig::resolve(
            self.server.as_deref(),
            self.session,
            self.match_url.as_deref(),
            self.unmatch_url.as_deref(),
        )?
        .with_csrf_token(self.csrf_token.clone()))
    }

    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the client cannot
    /// be built.
    pub fn gateway(&self) -> Result<HttpGateway, GatewayError> {
        HttpGateway::new(self.config()?)
    }
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}

/// Load a snapshot file, or stdin when the path is `-`
///
/// # Errors
///
/// Returns an error if the input cannot be read or is not a snapshot.
pub fn load_snapshot(path: &Path) -> anyhow::Result<(MatchStore, IngestReport)> {
    if path.to_string_lossy() == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .take(MAX_SNAPSHOT_BYTES + 1)
            .read_to_string(&mut buffer)?;
        check_snapshot_size(buffer.len() as u64)?;
        let mut store = MatchStore::new();
        let report = snapshot::ingest(&mut store, &buffer)?;
        return Ok((store, report));
    }
    Ok(snapshot::load_file(path)?)
}

/// Run a future on a single-threaded runtime
///
/// # Errors
///
/// Returns an error if the runtime cannot be created.
pub fn block_on<F: std::future::Future>(future: F) -> anyhow::Result<F::Output> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    Ok(rt.block_on(future))
}

/// Drag a GL line onto a bank line and drop it, start to finish
pub async fn drag_gesture<G: MatchGateway>(
    session: &mut ReconcileSession,
    gateway: &G,
    gl: &LineId,
    bank: &LineId,
) -> Outcome {
    let source = LineRef::new(Side::Gl, gl.clone());
    let target = LineRef::new(Side::Bank, bank.clone());
    let payload = session.on_drag_start(&source);
    session.on_drag_over(&target);
    let outcome = session
        .drop_and_match(gateway, &target, payload.as_deref())
        .await;
    session.on_drag_end();
    outcome
}

/// One-line summary of an outcome for text output
pub fn describe(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Matched(created) => format!(
            "Matched: match {} (bank {}; gl {})",
            created.match_id,
            join_ids(&created.bank_lines),
            join_ids(&created.gl_lines)
        ),
        Outcome::ReloadRequired => "Match removed; reload required".to_string(),
        Outcome::Busy => "Ignored: a match request is already in flight".to_string(),
        Outcome::Ignored => "Ignored".to_string(),
        other => other
            .message()
            .unwrap_or_default()
            .replace('\n', " / "),
    }
}

pub fn join_ids<T: std::fmt::Display>(ids: impl IntoIterator<Item = T>) -> String {
    ids.into_iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
