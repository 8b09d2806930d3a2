//! Unmatch command - delete one match on the server.
//!
//! The local view is never edited after a delete; the next snapshot from the
//! server is the only source of what remains.

use std::io::{BufRead, Write};

use clap::Args;

use crate::cli::create::outcome_name;
use crate::cli::{block_on, describe, GatewayArgs, OutputFormat};
use crate::core::types::MatchId;
use crate::session::reconcile::ReconcileSession;
use crate::utils::validation::normalize_id;

/// Arguments for the unmatch command
#[derive(Args)]
pub struct UnmatchArgs {
    /// Match ID to delete
    #[arg(required = true)]
    pub match_id: String,

    /// Do not ask for confirmation
    #[arg(short, long)]
    pub yes: bool,

    #[command(flatten)]
    pub gateway: GatewayArgs,
}

/// Execute the unmatch command
///
/// # Errors
///
/// Returns an error if the gateway is not configured, confirmation is
/// declined, or the server does not confirm the delete.
#[allow(clippy::needless_pass_by_value)]
pub fn run(args: UnmatchArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let match_id = MatchId::new(normalize_id(&args.match_id)?);
    let gateway = args.gateway.gateway()?;

    if !args.yes && !confirm(&match_id)? {
        eprintln!("Cancelled");
        return Ok(());
    }

    if verbose {
        eprintln!(
            "Deleting match {match_id} via {}",
            gateway.config().unmatch_url
        );
    }

    let mut session = ReconcileSession::default();
    let outcome = block_on(session.unmatch(&gateway, &match_id))?;

    match format {
        OutputFormat::Text => {
            if outcome.is_success() {
                println!("Match {match_id} removed. Reload the snapshot to see current matches.");
            } else {
                println!("{}", describe(&outcome));
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "match_id": match_id,
                "result": outcome,
                "message": outcome.message(),
                "reload_required": session.reload_required(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Tsv => {
            println!("match_id\toutcome\treload_required");
            println!(
                "{match_id}\t{}\t{}",
                outcome_name(&outcome),
                session.reload_required()
            );
        }
    }

    if !outcome.is_success() {
        anyhow::bail!(
            "{}",
            outcome
                .message()
                .unwrap_or_else(|| "match was not removed".to_string())
        );
    }

    Ok(())
}

fn confirm(match_id: &MatchId) -> anyhow::Result<bool> {
    eprint!("Remove match {match_id}? [y/N] ");
    std::io::stderr().flush()?;

    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}
