//! Executes organization plans and replays undo records.
//!
//! Operations inside one plan run sequentially in plan order, because the
//! conflict-resolved target names assume earlier operations' side effects.
//! Each operation fails independently; the batch always runs to the end and
//! produces a report.

use crate::models::{ExecutionReport, FileOperation, OperationKind, OrganizationPlan};
use semorg_storage::{ReverseOp, UndoRecord};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, error, info, warn};

/// Runs one plan. A dry run touches nothing and counts every operation as
/// nominally successful, so repeated dry runs are idempotent.
pub fn execute_plan(plan: &OrganizationPlan, dry_run: bool) -> ExecutionReport {
    info!(
        project = %plan.project_name,
        operations = plan.operations.len(),
        dry_run,
        "executing organization plan"
    );

    let mut report = ExecutionReport {
        project_name: plan.project_name.clone(),
        dry_run,
        total_operations: plan.operations.len(),
        successful_operations: 0,
        failed_operations: 0,
        conflicts_resolved: plan.conflicts.len(),
        errors: Vec::new(),
    };

    if dry_run {
        for op in &plan.operations {
            debug!(
                "would {:?}: {} -> {}",
                op.kind,
                op.source.display(),
                op.target.display()
            );
            report.successful_operations += 1;
        }
        return report;
    }

    if let Err(e) = fs::create_dir_all(&plan.base_destination) {
        error!(
            "failed to create base directory {}: {e}",
            plan.base_destination.display()
        );
        report.errors.push(format!("failed to create base directory: {e}"));
        report.failed_operations = plan.operations.len();
        return report;
    }

    for op in &plan.operations {
        match apply_operation(op) {
            Ok(()) => report.successful_operations += 1,
            Err(e) => {
                error!(
                    "failed to {:?} {} -> {}: {e}",
                    op.kind,
                    op.source.display(),
                    op.target.display()
                );
                report.failed_operations += 1;
                report.errors.push(format!(
                    "{:?} {} -> {}: {e}",
                    op.kind,
                    op.source.display(),
                    op.target.display()
                ));
            }
        }
    }

    report
}

fn apply_operation(op: &FileOperation) -> io::Result<()> {
    if let Some(parent) = op.target.parent() {
        fs::create_dir_all(parent)?;
    }
    match op.kind {
        OperationKind::Move => move_file(&op.source, &op.target),
        OperationKind::Copy => fs::copy(&op.source, &op.target).map(|_| ()),
    }
}

/// Rename first; fall back to copy-then-remove for cross-device moves.
fn move_file(source: &Path, target: &Path) -> io::Result<()> {
    match fs::rename(source, target) {
        Ok(()) => Ok(()),
        Err(_) => {
            fs::copy(source, target)?;
            fs::remove_file(source)
        }
    }
}

/// Captures the reverse of every planned move, plus the base directories the
/// run will create. Taken before execution so undo survives partial failure.
pub fn undo_record_for(plans: &[OrganizationPlan]) -> UndoRecord {
    let mut operations = Vec::new();
    let mut created_directories = Vec::new();

    for plan in plans {
        for op in &plan.operations {
            if op.kind == OperationKind::Move {
                operations.push(ReverseOp {
                    source: op.target.clone(),
                    target: op.source.clone(),
                });
            }
        }
        created_directories.push(plan.base_destination.clone());
    }

    UndoRecord::new(operations, created_directories)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UndoReport {
    pub successful_operations: usize,
    pub failed_operations: usize,
    pub errors: Vec<String>,
}

/// Replays reverse moves last-applied-first, then removes each created base
/// directory when (and only when) it ended up empty.
pub fn execute_undo(record: &UndoRecord) -> UndoReport {
    info!(
        operations = record.operations.len(),
        "executing undo operations"
    );

    let mut report = UndoReport {
        successful_operations: 0,
        failed_operations: 0,
        errors: Vec::new(),
    };

    for op in record.operations.iter().rev() {
        let result = op
            .target
            .parent()
            .map(fs::create_dir_all)
            .unwrap_or(Ok(()))
            .and_then(|_| move_file(&op.source, &op.target));
        match result {
            Ok(()) => report.successful_operations += 1,
            Err(e) => {
                report.failed_operations += 1;
                report.errors.push(format!(
                    "undo {} -> {}: {e}",
                    op.source.display(),
                    op.target.display()
                ));
            }
        }
    }

    for dir in &record.created_directories {
        remove_if_empty(dir);
    }

    info!(
        successful = report.successful_operations,
        failed = report.failed_operations,
        "undo complete"
    );
    report
}

fn remove_if_empty(dir: &Path) {
    if !dir.exists() {
        return;
    }
    // Subdirectories created for the plan empty out bottom-up first.
    let children: Vec<_> = match fs::read_dir(dir) {
        Ok(entries) => entries.filter_map(|e| e.ok()).collect(),
        Err(e) => {
            warn!("could not inspect directory {}: {e}", dir.display());
            return;
        }
    };
    for child in &children {
        if child.path().is_dir() {
            remove_if_empty(&child.path());
        }
    }
    let still_occupied = match fs::read_dir(dir) {
        Ok(mut entries) => entries.next().is_some(),
        Err(_) => true,
    };
    if still_occupied {
        return;
    }
    match fs::remove_dir(dir) {
        Ok(()) => info!("removed empty directory {}", dir.display()),
        Err(e) => warn!("could not remove directory {}: {e}", dir.display()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OperationKind;
    use std::path::PathBuf;

    fn plan_with(ops: Vec<FileOperation>, base: PathBuf) -> OrganizationPlan {
        OrganizationPlan {
            project_name: "Test".to_string(),
            base_destination: base,
            operations: ops,
            conflicts: Vec::new(),
        }
    }

    #[test]
    fn dry_run_touches_nothing_and_counts_everything() {
        let temp = tempfile::tempdir().unwrap();
        let src = temp.path().join("a.txt");
        fs::write(&src, "a").unwrap();
        let base = temp.path().join("out");

        let plan = plan_with(
            vec![FileOperation {
                kind: OperationKind::Move,
                source: src.clone(),
                target: base.join("a.txt"),
            }],
            base.clone(),
        );

        let report = execute_plan(&plan, true);
        assert_eq!(report.successful_operations, 1);
        assert!(src.exists());
        assert!(!base.exists());
    }

    #[test]
    fn failures_are_recorded_without_aborting_the_batch() {
        let temp = tempfile::tempdir().unwrap();
        let good = temp.path().join("good.txt");
        fs::write(&good, "g").unwrap();
        let base = temp.path().join("out");

        let plan = plan_with(
            vec![
                FileOperation {
                    kind: OperationKind::Move,
                    source: temp.path().join("missing.txt"),
                    target: base.join("missing.txt"),
                },
                FileOperation {
                    kind: OperationKind::Move,
                    source: good.clone(),
                    target: base.join("good.txt"),
                },
            ],
            base.clone(),
        );

        let report = execute_plan(&plan, false);
        assert_eq!(report.failed_operations, 1);
        assert_eq!(report.successful_operations, 1);
        assert_eq!(report.errors.len(), 1);
        assert!(base.join("good.txt").exists());
    }

    #[test]
    fn undo_replays_in_reverse_and_prunes_empty_dirs() {
        let temp = tempfile::tempdir().unwrap();
        let src = temp.path().join("src");
        fs::create_dir_all(&src).unwrap();
        let file = src.join("doc.txt");
        fs::write(&file, "content").unwrap();
        let base = temp.path().join("out").join("Project");

        let plan = plan_with(
            vec![FileOperation {
                kind: OperationKind::Move,
                source: file.clone(),
                target: base.join("Documents").join("doc.txt"),
            }],
            base.clone(),
        );

        let record = undo_record_for(std::slice::from_ref(&plan));
        let report = execute_plan(&plan, false);
        assert_eq!(report.successful_operations, 1);
        assert!(!file.exists());

        let undo = execute_undo(&record);
        assert_eq!(undo.successful_operations, 1);
        assert!(file.exists());
        assert_eq!(fs::read_to_string(&file).unwrap(), "content");
        assert!(!base.exists());
    }
}
