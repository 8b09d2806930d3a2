//! Replay command - drive a reconciliation session from a script of gestures.
//!
//! The script is JSON Lines, one event per line:
//!
//! ```text
//! {"event": "select", "side": "bank", "id": 5}
//! {"event": "select", "side": "gl", "id": 6}
//! {"event": "submit"}
//! {"event": "drag", "gl": 8, "bank": 9}
//! {"event": "drop", "bank": 9, "payload": "{\"gl_line_id\": 8}"}
//! {"event": "hover", "side": "gl", "id": 6}
//! {"event": "unhover"}
//! {"event": "unmatch", "match_id": 3}
//! ```
//!
//! Blank lines and lines starting with `#` are skipped. A successful unmatch
//! ends the replay: the local view is stale from then on, and only a fresh
//! snapshot from the server can replace it.

use std::io::BufRead;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::cli::create::outcome_name;
use crate::cli::{
    block_on, describe, drag_gesture, join_ids, load_snapshot, GatewayArgs, OutputFormat,
};
use crate::core::types::{LineId, LineRef, MatchId, Side};
use crate::session::reconcile::{Outcome, ReconcileSession};

/// Arguments for the replay command
#[derive(Args)]
pub struct ReplayArgs {
    /// Snapshot JSON file the session starts from
    #[arg(required = true)]
    pub snapshot: PathBuf,

    /// Event script, JSON Lines (use '-' for stdin)
    #[arg(required = true)]
    pub events: PathBuf,

    #[command(flatten)]
    pub gateway: GatewayArgs,
}

/// One scripted gesture
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    /// Toggle a line in the multi-select
    Select { side: Side, id: LineId },
    /// Submit the multi-select
    Submit,
    /// Full drag gesture: start on a GL line, hover and drop on a bank line
    Drag { gl: LineId, bank: LineId },
    /// Raw drop on a bank line with whatever payload the drag carried
    Drop {
        bank: LineId,
        #[serde(default)]
        payload: Option<String>,
    },
    Hover { side: Side, id: LineId },
    Unhover,
    Unmatch { match_id: MatchId },
}

impl Event {
    fn needs_server(&self) -> bool {
        matches!(
            self,
            Self::Submit | Self::Drag { .. } | Self::Drop { .. } | Self::Unmatch { .. }
        )
    }
}

/// What one event did
#[derive(Debug, Serialize)]
struct Step {
    line: usize,
    event: Event,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Outcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    selected: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    paired: Option<Vec<LineRef>>,
}

impl Step {
    fn new(line: usize, event: Event) -> Self {
        Self {
            line,
            event,
            result: None,
            selected: None,
            paired: None,
        }
    }
}

/// Parse an event script
///
/// # Errors
///
/// Returns an error naming the first line that is not a known event.
pub fn parse_events(reader: impl BufRead) -> anyhow::Result<Vec<(usize, Event)>> {
    let mut events = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let event: Event = serde_json::from_str(trimmed)
            .with_context(|| format!("line {}: not a replay event", index + 1))?;
        events.push((index + 1, event));
    }
    Ok(events)
}

fn read_events(path: &Path) -> anyhow::Result<Vec<(usize, Event)>> {
    if path.to_string_lossy() == "-" {
        return parse_events(std::io::stdin().lock());
    }
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    parse_events(std::io::BufReader::new(file))
}

/// Execute the replay command
///
/// # Errors
///
/// Returns an error if the snapshot or script cannot be read, or a network
/// event appears without a configured server.
#[allow(clippy::needless_pass_by_value)]
pub fn run(args: ReplayArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let events = read_events(&args.events)?;
    let (store, report) = load_snapshot(&args.snapshot)?;
    let mut session = ReconcileSession::from_store(store);

    if verbose {
        eprintln!(
            "Replaying {} events over {} groups ({} rows skipped)",
            events.len(),
            session.store().len(),
            report.skipped_rows
        );
    }

    let gateway = if events.iter().any(|(_, event)| event.needs_server()) {
        Some(args.gateway.gateway()?)
    } else {
        None
    };

    let total = events.len();
    let mut steps = Vec::with_capacity(total);

    block_on(async {
        for (line, event) in events {
            let mut step = Step::new(line, event.clone());
            match (&event, &gateway) {
                (Event::Select { side, id }, _) => {
                    step.selected =
                        Some(session.on_line_selected(&LineRef::new(*side, id.clone())));
                }
                (Event::Hover { side, id }, _) => {
                    let paired = session.on_hover(&LineRef::new(*side, id.clone()));
                    step.paired = Some(paired.into_iter().collect());
                }
                (Event::Unhover, _) => session.on_hover_end(),
                (Event::Submit, Some(gateway)) => {
                    step.result = Some(session.submit_selection(gateway).await);
                }
                (Event::Drag { gl, bank }, Some(gateway)) => {
                    step.result = Some(drag_gesture(&mut session, gateway, gl, bank).await);
                }
                (Event::Drop { bank, payload }, Some(gateway)) => {
                    let target = LineRef::new(Side::Bank, bank.clone());
                    session.on_drag_over(&target);
                    step.result = Some(
                        session
                            .drop_and_match(gateway, &target, payload.as_deref())
                            .await,
                    );
                }
                (Event::Unmatch { match_id }, Some(gateway)) => {
                    step.result = Some(session.unmatch(gateway, match_id).await);
                }
                (_, None) => anyhow::bail!("line {line}: event needs a server"),
            }
            steps.push(step);
            if session.reload_required() {
                break;
            }
        }
        Ok::<(), anyhow::Error>(())
    })??;

    let not_replayed = total - steps.len();
    if not_replayed > 0 {
        tracing::warn!(not_replayed, "Replay stopped, snapshot must be reloaded");
    }

    match format {
        OutputFormat::Text => print_text(&steps, &session, not_replayed),
        OutputFormat::Json => print_json(&steps, &session, not_replayed)?,
        OutputFormat::Tsv => print_tsv(&steps),
    }

    Ok(())
}

fn summarize(step: &Step) -> String {
    if let Some(outcome) = &step.result {
        return describe(outcome);
    }
    if let Some(selected) = step.selected {
        return if selected { "selected" } else { "deselected" }.to_string();
    }
    if let Some(paired) = &step.paired {
        return format!("paired: {}", join_ids(paired));
    }
    "ok".to_string()
}

fn event_name(event: &Event) -> &'static str {
    match event {
        Event::Select { .. } => "select",
        Event::Submit => "submit",
        Event::Drag { .. } => "drag",
        Event::Drop { .. } => "drop",
        Event::Hover { .. } => "hover",
        Event::Unhover => "unhover",
        Event::Unmatch { .. } => "unmatch",
    }
}

fn print_text(steps: &[Step], session: &ReconcileSession, not_replayed: usize) {
    for step in steps {
        println!(
            "[{}] {}: {}",
            step.line,
            event_name(&step.event),
            summarize(step)
        );
    }

    println!();
    if session.reload_required() {
        println!("Reload required: fetch a fresh snapshot from the server before continuing");
        if not_replayed > 0 {
            println!("  {not_replayed} events not replayed");
        }
        return;
    }

    println!("Groups: {}", session.store().len());
    for (line, view) in session.board().iter() {
        let decorations: Vec<_> = view
            .decorations
            .iter()
            .map(|d| d.as_str())
            .collect();
        println!(
            "  {line}: {} [{}]",
            if session.store().is_matched(line) {
                "matched"
            } else {
                "unmatched"
            },
            decorations.join(", ")
        );
    }
}

fn print_json(
    steps: &[Step],
    session: &ReconcileSession,
    not_replayed: usize,
) -> anyhow::Result<()> {
    if session.reload_required() {
        let output = serde_json::json!({
            "steps": steps,
            "reload_required": true,
            "not_replayed": not_replayed,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let board: Vec<_> = session
        .board()
        .iter()
        .map(|(line, view)| {
            serde_json::json!({
                "line": line,
                "state": view.state(),
                "decorations": view.decorations,
                "match_ids": view.match_ids,
            })
        })
        .collect();

    let output = serde_json::json!({
        "steps": steps,
        "reload_required": false,
        "groups": session.store().groups().collect::<Vec<_>>(),
        "board": board,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_tsv(steps: &[Step]) {
    println!("line\tevent\toutcome");
    for step in steps {
        let outcome = step.result.as_ref().map_or("", outcome_name);
        println!("{}\t{}\t{}", step.line, event_name(&step.event), outcome);
    }
}
