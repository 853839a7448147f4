//! Row-count reconciliation with backup-gated deletion
//!
//! For each task the archive column of a target table is resolved through a mapping
//! database, the rows matching the task's condition are counted and compared with the
//! expected count, and on a confirmed mismatch those rows are exported to a `.sql`
//! backup file and then deleted.

pub mod backup;
pub mod config;
pub mod db;
pub mod error;
pub mod identifier;
pub mod predicate;
pub mod reconcile;
pub mod report;
pub mod resolver;
pub mod rows;
pub mod task;
pub mod value;

pub use backup::{BackupArtifact, BackupExporter};
pub use config::Config;
pub use error::{ReconcileError, Result};
pub use reconcile::{Confirmer, Reconciler, ReconciliationResult, RunSummary, TaskOutcome};
pub use task::ReconciliationTask;
