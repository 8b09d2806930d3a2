//! Inspect command - load a snapshot and show every match group.

use std::path::PathBuf;

use clap::Args;

use crate::cli::{join_ids, load_snapshot, OutputFormat};
use crate::core::types::Side;
use crate::graph::snapshot::IngestReport;
use crate::graph::store::{Inconsistency, MatchStore};

/// Arguments for the inspect command
#[derive(Args)]
pub struct InspectArgs {
    /// Snapshot JSON file (use '-' for stdin)
    /// Accepts {"matches": [...]}, {"pairs": [...]} or both
    #[arg(required = true)]
    pub snapshot: PathBuf,

    /// Only show groups with no bank or no GL members
    #[arg(long)]
    pub degenerate: bool,
}

/// Execute the inspect command
///
/// # Errors
///
/// Returns an error if the snapshot cannot be loaded or the index is
/// inconsistent.
#[allow(clippy::needless_pass_by_value)]
pub fn run(args: InspectArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let (store, report) = load_snapshot(&args.snapshot)?;

    if verbose {
        eprintln!(
            "Loaded {} grouped rows and {} pair rows ({} rows, {} ids skipped)",
            report.groups, report.pairs, report.skipped_rows, report.skipped_ids
        );
    }

    let problems = store.check_consistency();

    match format {
        OutputFormat::Text => print_text(&args, &store, &report, &problems),
        OutputFormat::Json => print_json(&args, &store, &report, &problems)?,
        OutputFormat::Tsv => print_tsv(&args, &store),
    }

    if !problems.is_empty() {
        anyhow::bail!("match index is inconsistent ({} problems)", problems.len());
    }

    Ok(())
}

fn print_text(
    args: &InspectArgs,
    store: &MatchStore,
    report: &IngestReport,
    problems: &[Inconsistency],
) {
    println!("Snapshot: {}", args.snapshot.display());
    println!("  Groups:        {}", store.len());
    println!(
        "  Matched lines: {} bank, {} GL",
        store.matched_line_count(Side::Bank),
        store.matched_line_count(Side::Gl)
    );
    println!(
        "  Rows:          {} grouped, {} pairs",
        report.groups, report.pairs
    );
    if report.skipped_rows > 0 || report.skipped_ids > 0 {
        println!(
            "  Skipped:       {} rows, {} ids",
            report.skipped_rows, report.skipped_ids
        );
    }
    if problems.is_empty() {
        println!("  Consistency:   OK");
    } else {
        println!("  Consistency:   {} problems", problems.len());
        for problem in problems {
            let which = if problem.missing_from_index {
                "missing from line index"
            } else {
                "indexed but not a member"
            };
            println!("    match {} / {}: {}", problem.match_id, problem.line, which);
        }
    }

    for group in store.groups() {
        if args.degenerate && !group.is_degenerate() {
            continue;
        }
        println!();
        println!("Match {}", group.id);
        println!("  Bank: {}", join_ids(&group.bank_ids));
        println!("  GL:   {}", join_ids(&group.gl_ids));
        if group.is_degenerate() {
            println!("  (one side is empty)");
        }
    }
}

fn print_json(
    args: &InspectArgs,
    store: &MatchStore,
    report: &IngestReport,
    problems: &[Inconsistency],
) -> anyhow::Result<()> {
    let groups: Vec<_> = store
        .groups()
        .filter(|group| !args.degenerate || group.is_degenerate())
        .collect();

    let output = serde_json::json!({
        "snapshot": args.snapshot.display().to_string(),
        "generated_at": chrono::Utc::now().to_rfc3339(),
        "report": report,
        "matched_lines": {
            "bank": store.matched_line_count(Side::Bank),
            "gl": store.matched_line_count(Side::Gl),
        },
        "consistent": problems.is_empty(),
        "problems": problems,
        "groups": groups,
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_tsv(args: &InspectArgs, store: &MatchStore) {
    println!("match_id\tbank_ids\tgl_ids");
    for group in store.groups() {
        if args.degenerate && !group.is_degenerate() {
            continue;
        }
        println!(
            "{}\t{}\t{}",
            group.id,
            join_ids(&group.bank_ids).replace(", ", ","),
            join_ids(&group.gl_ids).replace(", ", ",")
        );
    }
}
