//! Console output and the end-of-run summary

use crate::backup::BackupArtifact;
use crate::reconcile::{ReconciliationResult, RunSummary, TaskFailure, TaskOutcome};
use crate::task::ReconciliationTask;
use serde_json::{json, Value};

pub fn print_task_header(position: usize, total: usize, task: &ReconciliationTask) {
    println!("\n--- Task {}/{} ---", position, total);
    println!(
        "Target: {}/{}.{}, condition: {}, expected rows: {}",
        task.target_host, task.database_name, task.table_name, task.search_condition, task.expected_row_count
    );
}

pub fn print_result(result: &ReconciliationResult) {
    println!("Archive column: {}", result.archive_column);
    println!("Actual rows: {}", result.actual_count);
    println!("Expected rows: {}", result.expected_count);

    if result.is_match {
        println!("✅ Row counts match, nothing to do");
    } else {
        println!("⚠️  Row count mismatch, difference: {:+}", result.difference());
    }
}

pub fn print_backup(artifact: &BackupArtifact) {
    println!("✓ Backed up {} rows to {}", artifact.row_count, artifact.path.display());
}

pub fn print_outcome(outcome: &TaskOutcome) {
    match outcome {
        TaskOutcome::Matched(_) => {}
        TaskOutcome::Declined(_) => println!("Skipped deletion"),
        TaskOutcome::Archived { deleted_rows, .. } => println!("✓ Deleted {} rows", deleted_rows),
    }
}

pub fn print_failure(failure: &TaskFailure) {
    println!("❌ Task {}", failure);
    if let Some(artifact) = &failure.artifact {
        println!("   Backup kept at {}", artifact.path.display());
    }
}

pub fn print_summary(summary: &RunSummary) {
    let rule = "=".repeat(50);
    println!("\n{}", rule);
    println!("Summary");
    println!("{}", rule);

    println!("Total tasks: {}", summary.total());
    println!("Matched: {}", summary.matched());
    println!("Mismatched: {}", summary.mismatched());
    println!("Failed: {}", summary.failed());
    if let Some(rate) = summary.match_rate() {
        println!("Match rate: {:.1}%", rate);
    }
    println!("Rows deleted: {}", summary.deleted_rows());

    let mismatches: Vec<_> = summary.results().filter(|r| !r.is_match).collect();
    if !mismatches.is_empty() {
        println!("\nMismatched tasks:");
        for result in mismatches {
            println!(
                "- {}.{}: actual {}, expected {} (difference: {:+})",
                result.task.database_name,
                result.task.table_name,
                result.actual_count,
                result.expected_count,
                result.difference()
            );
        }
    }

    let failures: Vec<_> = summary.failures().collect();
    if !failures.is_empty() {
        println!("\nFailed tasks:");
        for (task, failure) in failures {
            println!("- {}/{}.{}: {}", task.target_host, task.database_name, task.table_name, failure);
        }
    }

    let backups: Vec<_> = summary.backups().collect();
    if !backups.is_empty() {
        println!("\nBackup files:");
        for artifact in backups {
            println!("- {} ({} rows)", artifact.path.display(), artifact.row_count);
        }
    }
}

/// Machine-readable form of the summary
pub fn summary_json(summary: &RunSummary) -> Value {
    let tasks: Vec<Value> = summary
        .reports
        .iter()
        .map(|report| {
            let (status, stage, error, deleted_rows) = match &report.outcome {
                Ok(TaskOutcome::Matched(_)) => ("matched", None, None, None),
                Ok(TaskOutcome::Declined(_)) => ("declined", None, None, None),
                Ok(TaskOutcome::Archived { deleted_rows, .. }) => ("archived", None, None, Some(*deleted_rows)),
                Err(failure) => (
                    "failed",
                    Some(failure.stage.to_string()),
                    Some(failure.error.to_string()),
                    None,
                ),
            };

            json!({
                "task": report.task,
                "status": status,
                "result": report.result(),
                "backup": report.artifact(),
                "deleted_rows": deleted_rows,
                "failed_stage": stage,
                "error": error,
            })
        })
        .collect();

    json!({
        "total": summary.total(),
        "matched": summary.matched(),
        "mismatched": summary.mismatched(),
        "failed": summary.failed(),
        "match_rate": summary.match_rate(),
        "deleted_rows": summary.deleted_rows(),
        "tasks": tasks,
    })
}
