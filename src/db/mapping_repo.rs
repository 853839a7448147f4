//! Archive column mapping repository for MySQL

use crate::db::store::MappingStore;
use crate::error::{ReconcileError, Result};
use crate::identifier::Identifier;
use async_trait::async_trait;
use sqlx::MySqlPool;
use tracing::warn;

pub struct MappingRepository {
    pool: MySqlPool,
    table: Identifier,
}

impl MappingRepository {
    pub fn new(pool: MySqlPool, table: Identifier) -> Self {
        Self { pool, table }
    }
}

#[async_trait]
impl MappingStore for MappingRepository {
    async fn archive_column(&mut self, db_prefix: &str, table_prefix: &str) -> Result<Option<String>> {
        // Two rows are enough to notice a duplicated prefix pair
        let sql = format!(
            "SELECT archive_column_name FROM {} WHERE table_name_pre = ? AND db_name_pre = ? LIMIT 2",
            self.table.quoted()
        );

        let columns: Vec<String> = sqlx::query_scalar::<_, String>(&sql)
            .bind(table_prefix)
            .bind(db_prefix)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| ReconcileError::Lookup(format!("Failed to query archive column mapping: {}", e)))?;

        if columns.len() > 1 {
            warn!(
                "Mapping table {} has duplicate rows for {}/{}; using the first one returned",
                self.table, db_prefix, table_prefix
            );
        }

        Ok(columns.into_iter().next())
    }

    async fn close(&mut self) {
        self.pool.close().await;
    }
}
