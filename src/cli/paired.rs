//! Paired command - show the lines that light up when hovering one line.

use std::path::PathBuf;

use clap::Args;

use crate::cli::{join_ids, load_snapshot, OutputFormat};
use crate::core::types::{LineRef, Side};
use crate::utils::validation::normalize_id;

/// Arguments for the paired command
#[derive(Args)]
#[command(group(clap::ArgGroup::new("line").required(true).args(["bank", "gl"])))]
pub struct PairedArgs {
    /// Snapshot JSON file (use '-' for stdin)
    #[arg(required = true)]
    pub snapshot: PathBuf,

    /// Bank line ID
    #[arg(long)]
    pub bank: Option<String>,

    /// GL line ID
    #[arg(long)]
    pub gl: Option<String>,
}

/// Execute the paired command
///
/// # Errors
///
/// Returns an error if the snapshot cannot be loaded or the line ID is invalid.
#[allow(clippy::needless_pass_by_value)]
pub fn run(args: PairedArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let line = match (&args.bank, &args.gl) {
        (Some(id), _) => LineRef::new(Side::Bank, normalize_id(id)?),
        (None, Some(id)) => LineRef::new(Side::Gl, normalize_id(id)?),
        (None, None) => anyhow::bail!("one of --bank or --gl is required"),
    };

    let (store, _report) = load_snapshot(&args.snapshot)?;
    let match_ids = store.matches_for(&line);
    let paired = store.paired_lines(&line);

    if verbose {
        eprintln!("{line} belongs to {} match groups", match_ids.len());
    }

    match format {
        OutputFormat::Text => {
            if paired.is_empty() {
                println!("{line} is not matched");
                return Ok(());
            }
            println!("{line} (matches: {})", join_ids(match_ids));
            for side in [Side::Bank, Side::Gl] {
                let ids: Vec<_> = paired
                    .iter()
                    .filter(|other| other.side == side)
                    .map(|other| &other.id)
                    .collect();
                let label = match side {
                    Side::Bank => "Bank",
                    Side::Gl => "GL",
                };
                println!("  {label}: {}", join_ids(ids));
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "line": line,
                "match_ids": match_ids,
                "paired": paired,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Tsv => {
            println!("side\tline_id");
            for other in &paired {
                println!("{}\t{}", other.side, other.id);
            }
        }
    }

    Ok(())
}
