use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use thiserror::Error;

use crate::core::types::{LineId, MatchId};
use crate::graph::store::MatchStore;
use crate::utils::validation::{check_snapshot_size, ValidationError};

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Failed to read snapshot: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse snapshot: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Snapshot must be a JSON object")]
    NotAnObject,

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// One snapshot row, normalized from either wire shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotRow {
    /// Current format: `{match_id, bank_ids: [...], gl_ids: [...]}`
    Group {
        match_id: MatchId,
        bank_ids: Vec<LineId>,
        gl_ids: Vec<LineId>,
    },
    /// Legacy format: `{match_id, bank_id, gl_id}`, one row per pair
    Pair {
        match_id: MatchId,
        bank_id: LineId,
        gl_id: LineId,
    },
}

/// Counts from one ingestion pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Grouped rows applied
    pub groups: usize,
    /// Legacy pair rows applied
    pub pairs: usize,
    /// Rows dropped as malformed
    pub skipped_rows: usize,
    /// Individual ids dropped from otherwise valid group rows
    pub skipped_ids: usize,
}

/// Both snapshot shapes folded into one ordered list of rows.
///
/// Grouped rows always precede pair rows, so applying the list in order gives
/// grouped membership first and legacy pairs second.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedSnapshot {
    pub rows: Vec<SnapshotRow>,
    pub skipped_rows: usize,
    pub skipped_ids: usize,
}

impl NormalizedSnapshot {
    /// Parse snapshot text. Blank text is an empty snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not JSON or not a JSON object.
    pub fn from_json(text: &str) -> Result<Self, SnapshotError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(&value)
    }

    /// Normalize an already-parsed snapshot document.
    ///
    /// Individual rows are validated one at a time; a malformed row is counted
    /// and dropped without affecting the rest.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError::NotAnObject` if the document is not an object.
    pub fn from_value(value: &Value) -> Result<Self, SnapshotError> {
        let obj = value.as_object().ok_or(SnapshotError::NotAnObject)?;
        let mut snapshot = Self::default();

        for row in rows_of(obj.get("matches")) {
            match parse_group(row) {
                Some((parsed, dropped)) => {
                    snapshot.skipped_ids += dropped;
                    snapshot.rows.push(parsed);
                }
                None => {
                    tracing::debug!("Skipping malformed group row: {row}");
                    snapshot.skipped_rows += 1;
                }
            }
        }

        for row in rows_of(obj.get("pairs")) {
            match parse_pair(row) {
                Some(parsed) => snapshot.rows.push(parsed),
                None => {
                    tracing::debug!("Skipping malformed pair row: {row}");
                    snapshot.skipped_rows += 1;
                }
            }
        }

        Ok(snapshot)
    }

    /// Fold every row into `store`
    pub fn apply(&self, store: &mut MatchStore) -> IngestReport {
        let mut report = IngestReport {
            skipped_rows: self.skipped_rows,
            skipped_ids: self.skipped_ids,
            ..IngestReport::default()
        };

        for row in &self.rows {
            match row {
                SnapshotRow::Group {
                    match_id,
                    bank_ids,
                    gl_ids,
                } => {
                    store.add_members(match_id, bank_ids, gl_ids);
                    report.groups += 1;
                }
                SnapshotRow::Pair {
                    match_id,
                    bank_id,
                    gl_id,
                } => {
                    store.add_relation(match_id, bank_id, gl_id);
                    report.pairs += 1;
                }
            }
        }

        tracing::debug!(
            groups = report.groups,
            pairs = report.pairs,
            skipped = report.skipped_rows,
            "Ingested snapshot"
        );
        report
    }
}

/// Parse snapshot text and fold it into `store`
///
/// # Errors
///
/// Returns an error if the text is not a JSON object.
pub fn ingest(store: &mut MatchStore, text: &str) -> Result<IngestReport, SnapshotError> {
    Ok(NormalizedSnapshot::from_json(text)?.apply(store))
}

/// Build a fresh store from a snapshot file
///
/// # Errors
///
/// Returns an error if the file cannot be read, is too large, or is not a
/// JSON object.
pub fn load_file(path: &Path) -> Result<(MatchStore, IngestReport), SnapshotError> {
    check_snapshot_size(std::fs::metadata(path)?.len())?;
    let content = std::fs::read_to_string(path)?;
    let mut store = MatchStore::new();
    let report = ingest(&mut store, &content)?;
    Ok((store, report))
}

/// A missing or non-array list is treated as empty
fn rows_of(value: Option<&Value>) -> impl Iterator<Item = &Value> {
    value.and_then(Value::as_array).into_iter().flatten()
}

fn parse_group(row: &Value) -> Option<(SnapshotRow, usize)> {
    let match_id = MatchId::from_json(row.get("match_id")?)?;
    let (bank_ids, bank_dropped) = parse_id_list(row.get("bank_ids")?)?;
    let (gl_ids, gl_dropped) = parse_id_list(row.get("gl_ids")?)?;
    Some((
        SnapshotRow::Group {
            match_id,
            bank_ids,
            gl_ids,
        },
        bank_dropped + gl_dropped,
    ))
}

fn parse_pair(row: &Value) -> Option<SnapshotRow> {
    Some(SnapshotRow::Pair {
        match_id: MatchId::from_json(row.get("match_id")?)?,
        bank_id: LineId::from_json(row.get("bank_id")?)?,
        gl_id: LineId::from_json(row.get("gl_id")?)?,
    })
}

/// Returns the valid ids plus how many entries were dropped.
/// `None` (including JSON null) means the list itself is missing.
fn parse_id_list(value: &Value) -> Option<(Vec<LineId>, usize)> {
    let items = value.as_array()?;
    let ids: Vec<LineId> = items.iter().filter_map(LineId::from_json).collect();
    let dropped = items.len() - ids.len();
    Some((ids, dropped))
}
