//! SQL backup export
//!
//! Before any deletion, the rows it would remove are written to a `.sql` file as
//! standalone INSERT statements:
//!
//! ```text
//! -- Backup time: 2024-01-16 09:12:44
//! -- Source database: shop_01
//! -- Source table: orders_02
//! -- Condition: 20240115
//! -- Archive column: created_at
//!
//! INSERT INTO `orders_02` (`id`, `created_at`) VALUES (1, '2024-01-15 08:00:00');
//!
//! -- Backup complete: 1 rows exported
//! ```

use crate::db::{RowSink, TargetStore};
use crate::error::{ReconcileError, Result};
use crate::identifier::{quote_result_column, Identifier};
use crate::predicate::Predicate;
use crate::task::ReconciliationTask;
use crate::value::SqlValue;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// A completed backup file. Never modified or removed after creation.
#[derive(Debug, Clone, Serialize)]
pub struct BackupArtifact {
    pub task: ReconciliationTask,
    pub path: PathBuf,
    pub created_at: DateTime<Local>,
    pub row_count: u64,
}

/// `backup_<database>_<table>_<YYYYMMDD_HHMMSS>.sql`
pub fn backup_file_name(database: &str, table: &str, at: &DateTime<Local>) -> String {
    format!("backup_{}_{}_{}.sql", database, table, at.format("%Y%m%d_%H%M%S"))
}

/// Serializes rows as INSERT statements into any writer.
pub struct BackupWriter<W: Write + Send> {
    out: W,
    table: Identifier,
    rows: u64,
}

impl<W: Write + Send> BackupWriter<W> {
    pub fn new(out: W, table: Identifier) -> Self {
        Self { out, table, rows: 0 }
    }

    pub fn write_header(
        &mut self,
        task: &ReconciliationTask,
        archive_column: &str,
        at: &DateTime<Local>,
    ) -> Result<()> {
        let header = format!(
            "-- Backup time: {}\n\
             -- Source database: {}\n\
             -- Source table: {}\n\
             -- Condition: {}\n\
             -- Archive column: {}\n\n",
            at.format("%Y-%m-%d %H:%M:%S"),
            task.database_name,
            task.table_name,
            task.search_condition,
            archive_column
        );
        self.write(header.as_bytes())
    }

    /// Write the row-count trailer and flush. Returns the writer and the rows written.
    pub fn finish(mut self) -> Result<(W, u64)> {
        let trailer = format!("\n-- Backup complete: {} rows exported\n", self.rows);
        self.write(trailer.as_bytes())?;
        self.out
            .flush()
            .map_err(|e| ReconcileError::io("Failed to flush backup", e))?;
        Ok((self.out, self.rows))
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.out
            .write_all(bytes)
            .map_err(|e| ReconcileError::io("Failed to write backup", e))
    }
}

impl<W: Write + Send> RowSink for BackupWriter<W> {
    fn write_row(&mut self, columns: &[String], values: &[SqlValue]) -> Result<()> {
        let column_list = columns
            .iter()
            .map(|c| quote_result_column(c))
            .collect::<Vec<_>>()
            .join(", ");
        let value_list = values
            .iter()
            .map(SqlValue::to_sql_literal)
            .collect::<Vec<_>>()
            .join(", ");

        let statement = format!(
            "INSERT INTO {} ({}) VALUES ({});\n",
            self.table.quoted(),
            column_list,
            value_list
        );
        self.write(statement.as_bytes())?;
        self.rows += 1;
        Ok(())
    }
}

/// Writes backup files into one directory
pub struct BackupExporter {
    backup_dir: PathBuf,
}

impl BackupExporter {
    pub fn new(backup_dir: impl Into<PathBuf>) -> Self {
        Self {
            backup_dir: backup_dir.into(),
        }
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Export every row matching `predicate` to a new file.
    ///
    /// The file is created exclusively: a second export of the same table within the
    /// same second fails instead of overwriting the earlier artifact. A read failure
    /// part-way through leaves the partial file on disk.
    pub async fn export<T: TargetStore + ?Sized>(
        &self,
        target: &mut T,
        task: &ReconciliationTask,
        table: &Identifier,
        archive_column: &str,
        predicate: &Predicate,
    ) -> Result<BackupArtifact> {
        fs::create_dir_all(&self.backup_dir).map_err(|e| {
            ReconcileError::io(
                format!("Failed to create backup directory {}", self.backup_dir.display()),
                e,
            )
        })?;

        let created_at = Local::now();
        let path = self
            .backup_dir
            .join(backup_file_name(&task.database_name, &task.table_name, &created_at));

        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| ReconcileError::io(format!("Failed to create backup file {}", path.display()), e))?;

        let mut writer = BackupWriter::new(BufWriter::new(file), table.clone());
        writer.write_header(task, archive_column, &created_at)?;

        let streamed = target.export_matching(table, predicate, &mut writer).await?;
        let (buffered, row_count) = writer.finish()?;
        debug_assert_eq!(streamed, row_count);

        let file: File = buffered
            .into_inner()
            .map_err(|e| ReconcileError::io("Failed to flush backup", e.into_error()))?;
        file.sync_all()
            .map_err(|e| ReconcileError::io(format!("Failed to sync backup file {}", path.display()), e))?;

        info!("Backed up {} rows to {}", row_count, path.display());

        Ok(BackupArtifact {
            task: task.clone(),
            path,
            created_at,
            row_count,
        })
    }
}
