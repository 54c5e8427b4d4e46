//! Undo journal persistence.
//!
//! Every real (non-dry-run) organization run writes an [`UndoRecord`] to a
//! timestamped JSON file before considering the run complete. The record is
//! self-contained: loading it later is enough to drive a full rollback with
//! no other state.

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// A single reverse move: `source` is where the file ended up, `target` is
/// where it must go back to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReverseOp {
    pub source: PathBuf,
    pub target: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndoRecord {
    pub timestamp: DateTime<Utc>,
    /// Reverse operations in forward execution order; undo replays them
    /// last-applied-first.
    pub operations: Vec<ReverseOp>,
    pub created_directories: Vec<PathBuf>,
}

impl UndoRecord {
    pub fn new(operations: Vec<ReverseOp>, created_directories: Vec<PathBuf>) -> Self {
        Self {
            timestamp: Utc::now(),
            operations,
            created_directories,
        }
    }
}

/// Writes the record to `dir/undo_YYYYmmdd_HHMMSS.json` and returns the path.
pub fn save_journal(record: &UndoRecord, dir: &Path) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("creating journal directory {}", dir.display()))?;
    let name = format!("undo_{}.json", record.timestamp.format("%Y%m%d_%H%M%S"));
    let path = dir.join(name);
    let json = serde_json::to_string_pretty(record)?;
    fs::write(&path, json).with_context(|| format!("writing journal {}", path.display()))?;
    info!(journal = %path.display(), operations = record.operations.len(), "undo journal saved");
    Ok(path)
}

pub fn load_journal(path: &Path) -> anyhow::Result<UndoRecord> {
    let json =
        fs::read_to_string(path).with_context(|| format!("reading journal {}", path.display()))?;
    let record: UndoRecord = serde_json::from_str(&json)
        .with_context(|| format!("parsing journal {}", path.display()))?;
    Ok(record)
}

/// Journals in `dir`, newest first. Missing directory is an empty list.
pub fn list_journals(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut journals = Vec::new();
    if !dir.exists() {
        return Ok(journals);
    }
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if entry.file_type()?.is_file() && name.starts_with("undo_") && name.ends_with(".json") {
            journals.push(path);
        }
    }
    journals.sort();
    journals.reverse();
    Ok(journals)
}
