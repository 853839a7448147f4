//! Deletion confirmation

use crate::reconcile::outcome::ReconciliationResult;
use std::io::{self, BufRead, StdinLock, Stdout, Write};
use tracing::warn;

/// Decides whether a mismatched task proceeds to backup and deletion.
pub trait Confirmer {
    fn confirm(&mut self, result: &ReconciliationResult) -> bool;
}

impl<F> Confirmer for F
where
    F: FnMut(&ReconciliationResult) -> bool,
{
    fn confirm(&mut self, result: &ReconciliationResult) -> bool {
        self(result)
    }
}

/// Asks the operator on a terminal-like stream pair. Only `y`/`yes` confirm.
pub struct PromptConfirmer<R, W> {
    input: R,
    output: W,
}

impl PromptConfirmer<StdinLock<'static>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> PromptConfirmer<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn prompt(&mut self, result: &ReconciliationResult) -> io::Result<String> {
        let task = &result.task;
        writeln!(self.output)?;
        writeln!(self.output, "Row count mismatch. Delete the matching rows?")?;
        writeln!(self.output, "Table: {}.{}", task.database_name, task.table_name)?;
        writeln!(self.output, "Condition: {} on {}", task.search_condition, result.archive_column)?;
        writeln!(self.output, "Rows to delete: {}", result.actual_count)?;
        write!(self.output, "Enter y/yes to back up and delete, n/no to skip: ")?;
        self.output.flush()?;

        let mut answer = String::new();
        self.input.read_line(&mut answer)?;
        Ok(answer)
    }
}

impl<R: BufRead, W: Write> Confirmer for PromptConfirmer<R, W> {
    fn confirm(&mut self, result: &ReconciliationResult) -> bool {
        match self.prompt(result) {
            Ok(answer) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
            Err(e) => {
                warn!("Could not read confirmation, skipping deletion: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::ReconciliationTask;

    fn result() -> ReconciliationResult {
        let task = ReconciliationTask {
            target_host: "db1.host".to_string(),
            database_name: "shop_01".to_string(),
            table_name: "orders_02".to_string(),
            search_condition: "20240115".to_string(),
            expected_row_count: 3,
        };
        ReconciliationResult::new(task, "created_at".to_string(), 5)
    }

    fn answer(input: &str) -> (bool, String) {
        let mut output = Vec::new();
        let confirmed = PromptConfirmer::new(input.as_bytes(), &mut output).confirm(&result());
        (confirmed, String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_yes_answers_confirm() {
        for input in ["y\n", "YES\n", "  Yes  \n"] {
            assert!(answer(input).0, "{:?} should confirm", input);
        }
    }

    #[test]
    fn test_anything_else_declines() {
        for input in ["n\n", "no\n", "\n", "", "yep\n"] {
            assert!(!answer(input).0, "{:?} should decline", input);
        }
    }

    #[test]
    fn test_prompt_names_table_and_rows() {
        let (_, prompt) = answer("n\n");
        assert!(prompt.contains("shop_01.orders_02"));
        assert!(prompt.contains("Rows to delete: 5"));
    }

    #[test]
    fn test_closures_are_confirmers() {
        let mut always = |_: &ReconciliationResult| true;
        assert!(always.confirm(&result()));
    }
}
