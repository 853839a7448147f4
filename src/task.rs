//! Reconciliation tasks and the line-oriented task file
//!
//! One task per line: `target_host,database_name,table_name,search_condition,expected_row_count`.
//! Blank lines and `#` comments are skipped. Any malformed line rejects the whole file.

use crate::error::{ReconcileError, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Serialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;

const TASK_FIELDS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconciliationTask {
    pub target_host: String,
    pub database_name: String,
    pub table_name: String,
    /// A string prefix, or a `YYYYMMDD` date for date-like archive columns.
    pub search_condition: String,
    pub expected_row_count: u64,
}

/// Load tasks from a file on disk
pub fn load_tasks(path: &Path) -> Result<Vec<ReconciliationTask>> {
    let file = File::open(path)
        .map_err(|e| ReconcileError::io(format!("Failed to open task file {}", path.display()), e))?;
    parse_tasks(file)
}

pub fn parse_tasks<R: Read>(reader: R) -> Result<Vec<ReconciliationTask>> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .quoting(false)
        .comment(Some(b'#'))
        .from_reader(reader);

    let mut tasks = Vec::new();
    let mut record = StringRecord::new();

    loop {
        match csv_reader.read_record(&mut record) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => {
                let line = e.position().map(|p| p.line()).unwrap_or(0);
                return Err(ReconcileError::TaskFile {
                    line,
                    message: e.to_string(),
                });
            }
        }

        let line = record.position().map(|p| p.line()).unwrap_or(0);

        // Whitespace-only lines and indented comments
        if record.iter().all(str::is_empty) || record.get(0).is_some_and(|f| f.starts_with('#')) {
            continue;
        }

        tasks.push(parse_record(&record, line)?);
    }

    Ok(tasks)
}

fn parse_record(record: &StringRecord, line: u64) -> Result<ReconciliationTask> {
    if record.len() != TASK_FIELDS {
        return Err(ReconcileError::TaskFile {
            line,
            message: format!("expected {} fields, found {}", TASK_FIELDS, record.len()),
        });
    }

    let expected_row_count = record[4].parse::<u64>().map_err(|e| ReconcileError::TaskFile {
        line,
        message: format!("invalid expected row count '{}': {}", &record[4], e),
    })?;

    Ok(ReconciliationTask {
        target_host: record[0].to_string(),
        database_name: record[1].to_string(),
        table_name: record[2].to_string(),
        search_condition: record[3].to_string(),
        expected_row_count,
    })
}
