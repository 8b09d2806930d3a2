//! Match command - ask the server to group bank lines with GL lines.
//!
//! One ID per side is sent the way a drag-and-drop sends it; anything larger
//! goes out as a multi-select submission.

use std::path::PathBuf;

use clap::Args;

use crate::cli::{
    block_on, describe, drag_gesture, join_ids, load_snapshot, GatewayArgs, OutputFormat,
};
use crate::core::types::{LineId, LineRef, Side};
use crate::session::reconcile::{Outcome, ReconcileSession};
use crate::utils::validation::normalize_id;

/// Arguments for the match command
#[derive(Args)]
pub struct MatchArgs {
    /// Bank line IDs (repeatable)
    #[arg(long = "bank", required = true, num_args = 1..)]
    pub bank_ids: Vec<String>,

    /// GL line IDs (repeatable)
    #[arg(long = "gl", required = true, num_args = 1..)]
    pub gl_ids: Vec<String>,

    /// Snapshot to start from; its matches are shown alongside the new one
    #[arg(long)]
    pub snapshot: Option<PathBuf>,

    #[command(flatten)]
    pub gateway: GatewayArgs,
}

/// Execute the match command
///
/// # Errors
///
/// Returns an error if an ID is invalid, the gateway is not configured, or the
/// server does not confirm the match.
#[allow(clippy::needless_pass_by_value)]
pub fn run(args: MatchArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let bank_ids = parse_ids(&args.bank_ids)?;
    let gl_ids = parse_ids(&args.gl_ids)?;
    let gateway = args.gateway.gateway()?;

    let mut session = match &args.snapshot {
        Some(path) => ReconcileSession::from_store(load_snapshot(path)?.0),
        None => ReconcileSession::default(),
    };

    if verbose {
        eprintln!(
            "Matching bank [{}] with GL [{}] via {}",
            join_ids(&bank_ids),
            join_ids(&gl_ids),
            gateway.config().match_url
        );
    }

    let outcome = block_on(async {
        if let ([bank], [gl]) = (bank_ids.as_slice(), gl_ids.as_slice()) {
            drag_gesture(&mut session, &gateway, gl, bank).await
        } else {
            for id in &bank_ids {
                session.on_line_selected(&LineRef::new(Side::Bank, id.clone()));
            }
            for id in &gl_ids {
                session.on_line_selected(&LineRef::new(Side::Gl, id.clone()));
            }
            session.submit_selection(&gateway).await
        }
    })?;

    print_outcome(&outcome, &session, format)?;

    if !outcome.is_success() {
        anyhow::bail!(
            "{}",
            outcome
                .message()
                .unwrap_or_else(|| "match was not created".to_string())
        );
    }

    Ok(())
}

fn parse_ids(raw: &[String]) -> anyhow::Result<Vec<LineId>> {
    let mut ids: Vec<LineId> = Vec::with_capacity(raw.len());
    for value in raw {
        let id = LineId::new(normalize_id(value)?);
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    Ok(ids)
}

fn print_outcome(
    outcome: &Outcome,
    session: &ReconcileSession,
    format: OutputFormat,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => {
            println!("{}", describe(outcome));
            if let Outcome::Matched(created) = outcome {
                if let (Some(bank), Some(gl)) = (&created.bank_amount, &created.gl_amount) {
                    println!("  Amounts: bank {bank}, GL {gl}");
                }
                println!("  Groups known: {}", session.store().len());
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "result": outcome,
                "message": outcome.message(),
                "groups_known": session.store().len(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Tsv => {
            println!("outcome\tmatch_id\tbank_ids\tgl_ids");
            match outcome {
                Outcome::Matched(created) => println!(
                    "matched\t{}\t{}\t{}",
                    created.match_id,
                    join_ids(&created.bank_lines).replace(", ", ","),
                    join_ids(&created.gl_lines).replace(", ", ",")
                ),
                other => println!("{}\t\t\t", outcome_name(other)),
            }
        }
    }
    Ok(())
}

/// Snake-case name of an outcome, as used in JSON output
pub fn outcome_name(outcome: &Outcome) -> &'static str {
    match outcome {
        Outcome::Matched(_) => "matched",
        Outcome::Rejected(_) => "rejected",
        Outcome::CreateFailed(_) => "create_failed",
        Outcome::UnmatchFailed(_) => "unmatch_failed",
        Outcome::SelectionIncomplete => "selection_incomplete",
        Outcome::Busy => "busy",
        Outcome::Ignored => "ignored",
        Outcome::ReloadRequired => "reload_required",
    }
}
