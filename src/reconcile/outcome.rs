//! Per-task results and the run summary

use crate::backup::BackupArtifact;
use crate::error::ReconcileError;
use crate::task::ReconciliationTask;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconciliationResult {
    pub task: ReconciliationTask,
    pub archive_column: String,
    pub actual_count: u64,
    pub expected_count: u64,
    pub is_match: bool,
}

impl ReconciliationResult {
    pub fn new(task: ReconciliationTask, archive_column: String, actual_count: u64) -> Self {
        let expected_count = task.expected_row_count;
        Self {
            task,
            archive_column,
            actual_count,
            expected_count,
            is_match: actual_count == expected_count,
        }
    }

    /// `actual - expected`
    pub fn difference(&self) -> i64 {
        let diff = i128::from(self.actual_count) - i128::from(self.expected_count);
        diff.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
    }
}

/// Where a task was when it stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TaskStage {
    Resolving,
    Counting,
    BackingUp,
    Deleting,
}

impl fmt::Display for TaskStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TaskStage::Resolving => "resolving",
            TaskStage::Counting => "counting",
            TaskStage::BackingUp => "backing up",
            TaskStage::Deleting => "deleting",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub enum TaskOutcome {
    Matched(ReconciliationResult),
    /// Mismatched, and the operator declined deletion
    Declined(ReconciliationResult),
    /// Mismatched, backed up, then deleted
    Archived {
        result: ReconciliationResult,
        artifact: BackupArtifact,
        deleted_rows: u64,
    },
}

impl TaskOutcome {
    pub fn result(&self) -> &ReconciliationResult {
        match self {
            TaskOutcome::Matched(result) | TaskOutcome::Declined(result) => result,
            TaskOutcome::Archived { result, .. } => result,
        }
    }
}

#[derive(Debug)]
pub struct TaskFailure {
    pub stage: TaskStage,
    pub error: ReconcileError,
    /// Present once counting finished
    pub result: Option<ReconciliationResult>,
    /// Present when the backup completed before a later failure
    pub artifact: Option<BackupArtifact>,
}

impl TaskFailure {
    pub fn new(stage: TaskStage, error: ReconcileError) -> Self {
        Self {
            stage,
            error,
            result: None,
            artifact: None,
        }
    }

    pub fn with_result(mut self, result: &ReconciliationResult) -> Self {
        self.result = Some(result.clone());
        self
    }

    pub fn with_artifact(mut self, artifact: &BackupArtifact) -> Self {
        self.artifact = Some(artifact.clone());
        self
    }
}

impl fmt::Display for TaskFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed while {}: {}", self.stage, self.error)
    }
}

#[derive(Debug)]
pub struct TaskReport {
    pub task: ReconciliationTask,
    pub outcome: Result<TaskOutcome, TaskFailure>,
}

impl TaskReport {
    pub fn result(&self) -> Option<&ReconciliationResult> {
        match &self.outcome {
            Ok(outcome) => Some(outcome.result()),
            Err(failure) => failure.result.as_ref(),
        }
    }

    pub fn artifact(&self) -> Option<&BackupArtifact> {
        match &self.outcome {
            Ok(TaskOutcome::Archived { artifact, .. }) => Some(artifact),
            Ok(_) => None,
            Err(failure) => failure.artifact.as_ref(),
        }
    }
}

/// Everything that happened in one run
#[derive(Debug, Default)]
pub struct RunSummary {
    pub reports: Vec<TaskReport>,
}

impl RunSummary {
    pub fn push(&mut self, task: ReconciliationTask, outcome: Result<TaskOutcome, TaskFailure>) {
        self.reports.push(TaskReport { task, outcome });
    }

    pub fn total(&self) -> usize {
        self.reports.len()
    }

    /// Tasks that got as far as a row count
    pub fn results(&self) -> impl Iterator<Item = &ReconciliationResult> {
        self.reports.iter().filter_map(TaskReport::result)
    }

    pub fn matched(&self) -> usize {
        self.results().filter(|r| r.is_match).count()
    }

    pub fn mismatched(&self) -> usize {
        self.results().filter(|r| !r.is_match).count()
    }

    pub fn failed(&self) -> usize {
        self.reports.iter().filter(|r| r.outcome.is_err()).count()
    }

    pub fn deleted_rows(&self) -> u64 {
        self.reports
            .iter()
            .filter_map(|r| match &r.outcome {
                Ok(TaskOutcome::Archived { deleted_rows, .. }) => Some(*deleted_rows),
                _ => None,
            })
            .sum()
    }

    pub fn backups(&self) -> impl Iterator<Item = &BackupArtifact> {
        self.reports.iter().filter_map(TaskReport::artifact)
    }

    pub fn failures(&self) -> impl Iterator<Item = (&ReconciliationTask, &TaskFailure)> {
        self.reports.iter().filter_map(|r| match &r.outcome {
            Err(failure) => Some((&r.task, failure)),
            Ok(_) => None,
        })
    }

    /// Percentage of counted tasks that matched
    pub fn match_rate(&self) -> Option<f64> {
        let counted = self.results().count();
        if counted == 0 {
            None
        } else {
            Some(self.matched() as f64 * 100.0 / counted as f64)
        }
    }
}
