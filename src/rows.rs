//! Row counting and deletion against a target table

use crate::db::TargetStore;
use crate::error::Result;
use crate::identifier::Identifier;
use crate::predicate::Predicate;
use tracing::{info, warn};

/// Count rows matching `predicate`. Errors propagate; a failed count is never 0.
pub async fn count_matching<T: TargetStore + ?Sized>(
    target: &mut T,
    table: &Identifier,
    predicate: &Predicate,
) -> Result<u64> {
    let count = target.count_matching(table, predicate).await?;
    info!("{} rows in {} match {}", count, table, predicate.where_clause());
    Ok(count)
}

/// Delete rows matching `predicate`. Not retried.
pub async fn delete_matching<T: TargetStore + ?Sized>(
    target: &mut T,
    table: &Identifier,
    predicate: &Predicate,
) -> Result<u64> {
    let deleted = target.delete_matching(table, predicate).await?;
    info!("Deleted {} rows from {}", deleted, table);
    Ok(deleted)
}

/// Warn when the delete touched a different number of rows than the backup holds.
pub fn check_deleted_against_backup(table: &Identifier, backed_up: u64, deleted: u64) -> bool {
    if backed_up != deleted {
        warn!(
            "{}: backup holds {} rows but {} were deleted; rows changed between backup and delete",
            table, backed_up, deleted
        );
        return false;
    }
    true
}
