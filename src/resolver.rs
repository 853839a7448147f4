//! Archive column resolution
//!
//! Sharded databases and tables carry a trailing `_<digits>` suffix (`orders_03`).
//! The mapping store is keyed by the unsuffixed prefixes.

use crate::db::MappingStore;
use crate::error::{ReconcileError, Result};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::info;

lazy_static! {
    static ref SHARD_SUFFIX: Regex = Regex::new(r"_\d+$").expect("shard suffix pattern is valid");
}

/// Strip one trailing `_<digits>` suffix, if present.
pub fn normalize_name_prefix(name: &str) -> &str {
    match SHARD_SUFFIX.find(name) {
        Some(m) => &name[..m.start()],
        None => name,
    }
}

/// Look up the archive column for a (database, table) pair by their normalized prefixes.
pub async fn resolve_archive_column<M: MappingStore + ?Sized>(
    mapping: &mut M,
    database_name: &str,
    table_name: &str,
) -> Result<String> {
    let db_prefix = normalize_name_prefix(database_name);
    let table_prefix = normalize_name_prefix(table_name);

    match mapping.archive_column(db_prefix, table_prefix).await? {
        Some(column) => {
            info!(
                "Archive column for {}.{} (prefixes {}/{}): {}",
                database_name, table_name, db_prefix, table_prefix, column
            );
            Ok(column)
        }
        None => Err(ReconcileError::NotFound(format!(
            "no archive column mapped for database prefix '{}', table prefix '{}'",
            db_prefix, table_prefix
        ))),
    }
}
