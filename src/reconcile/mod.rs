//! Reconciliation orchestrator
//!
//! Each task runs `Resolving → Counting → Matched | Mismatched`. A mismatch asks the
//! [`Confirmer`]; on confirmation the task moves through `BackingUp → Deleting`.
//! Deletion only starts after the backup file is complete. Any failure ends that task
//! and the run moves on to the next one.

pub mod confirm;
pub mod outcome;

pub use confirm::{Confirmer, PromptConfirmer};
pub use outcome::{ReconciliationResult, RunSummary, TaskFailure, TaskOutcome, TaskReport, TaskStage};

use crate::backup::BackupExporter;
use crate::db::{ConnectionRegistry, Connector, TargetStore};
use crate::error::Result;
use crate::identifier::Identifier;
use crate::predicate::{build_predicate, classify_type, Predicate};
use crate::report;
use crate::resolver::resolve_archive_column;
use crate::rows;
use crate::task::ReconciliationTask;
use tracing::{debug, error, info};

/// Everything needed to query the target table for one task
struct PreparedTask {
    table: Identifier,
    archive_column: String,
    predicate: Predicate,
}

pub struct Reconciler<C: Connector> {
    registry: ConnectionRegistry<C>,
    exporter: BackupExporter,
}

impl<C: Connector> Reconciler<C> {
    pub fn new(registry: ConnectionRegistry<C>, exporter: BackupExporter) -> Self {
        Self { registry, exporter }
    }

    pub fn registry(&self) -> &ConnectionRegistry<C> {
        &self.registry
    }

    /// Run every task in order. Individual failures are recorded, never fatal.
    pub async fn run(
        &mut self,
        tasks: &[ReconciliationTask],
        confirmer: &mut dyn Confirmer,
    ) -> RunSummary {
        let mut summary = RunSummary::default();

        for (index, task) in tasks.iter().enumerate() {
            report::print_task_header(index + 1, tasks.len(), task);

            let outcome = self.process(task, confirmer).await;
            match &outcome {
                Ok(outcome) => report::print_outcome(outcome),
                Err(failure) => {
                    error!(
                        "Task {}/{}.{} {}",
                        task.target_host, task.database_name, task.table_name, failure
                    );
                    report::print_failure(failure);
                }
            }

            summary.push(task.clone(), outcome);
        }

        summary
    }

    /// Drive one task to its final state.
    pub async fn process(
        &mut self,
        task: &ReconciliationTask,
        confirmer: &mut dyn Confirmer,
    ) -> std::result::Result<TaskOutcome, TaskFailure> {
        debug!("{}.{}: resolving", task.database_name, task.table_name);
        let prepared = self
            .prepare(task)
            .await
            .map_err(|e| TaskFailure::new(TaskStage::Resolving, e))?;

        debug!("{}.{}: counting", task.database_name, task.table_name);
        let actual_count = self
            .count(task, &prepared)
            .await
            .map_err(|e| TaskFailure::new(TaskStage::Counting, e))?;

        let result = ReconciliationResult::new(task.clone(), prepared.archive_column.clone(), actual_count);
        report::print_result(&result);

        if result.is_match {
            debug!("{}.{}: matched", task.database_name, task.table_name);
            return Ok(TaskOutcome::Matched(result));
        }

        debug!("{}.{}: mismatched", task.database_name, task.table_name);
        if !confirmer.confirm(&result) {
            info!("Deletion declined for {}.{}", task.database_name, task.table_name);
            return Ok(TaskOutcome::Declined(result));
        }

        self.archive_and_delete(task, &prepared, result).await
    }

    async fn prepare(&mut self, task: &ReconciliationTask) -> Result<PreparedTask> {
        let table = Identifier::parse(&task.table_name)?;

        let archive_column =
            resolve_archive_column(self.registry.mapping(), &task.database_name, &task.table_name).await?;
        let column = Identifier::parse(&archive_column)?;

        let target = self.registry.target(&task.target_host, &task.database_name).await?;
        let raw_type = target
            .column_data_type(&task.database_name, &table, &column)
            .await?;
        let column_type = classify_type(&raw_type);
        info!("Archive column {} has type {} ({:?})", column, raw_type, column_type);

        let predicate = build_predicate(&column, column_type, &raw_type, &task.search_condition)?;

        Ok(PreparedTask {
            table,
            archive_column,
            predicate,
        })
    }

    async fn count(&mut self, task: &ReconciliationTask, prepared: &PreparedTask) -> Result<u64> {
        let target = self.registry.target(&task.target_host, &task.database_name).await?;
        rows::count_matching(target, &prepared.table, &prepared.predicate).await
    }

    async fn archive_and_delete(
        &mut self,
        task: &ReconciliationTask,
        prepared: &PreparedTask,
        result: ReconciliationResult,
    ) -> std::result::Result<TaskOutcome, TaskFailure> {
        debug!("{}.{}: backing up", task.database_name, task.table_name);
        let target = self
            .registry
            .target(&task.target_host, &task.database_name)
            .await
            .map_err(|e| TaskFailure::new(TaskStage::BackingUp, e).with_result(&result))?;

        let artifact = self
            .exporter
            .export(
                target,
                task,
                &prepared.table,
                &prepared.archive_column,
                &prepared.predicate,
            )
            .await
            .map_err(|e| TaskFailure::new(TaskStage::BackingUp, e).with_result(&result))?;
        report::print_backup(&artifact);

        debug!("{}.{}: deleting", task.database_name, task.table_name);
        let deleted_rows = rows::delete_matching(target, &prepared.table, &prepared.predicate)
            .await
            .map_err(|e| {
                TaskFailure::new(TaskStage::Deleting, e)
                    .with_result(&result)
                    .with_artifact(&artifact)
            })?;
        rows::check_deleted_against_backup(&prepared.table, artifact.row_count, deleted_rows);

        Ok(TaskOutcome::Archived {
            result,
            artifact,
            deleted_rows,
        })
    }

    /// Close every connection held by the registry.
    pub async fn shutdown(self) {
        self.registry.close().await;
    }
}
