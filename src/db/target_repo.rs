//! Target table repository for MySQL
//!
//! Every statement against the target table takes its WHERE clause and bound values
//! from the same [`Predicate`].

use crate::db::store::{RowSink, TargetStore};
use crate::error::{ReconcileError, Result};
use crate::identifier::Identifier;
use crate::predicate::Predicate;
use crate::value::SqlValue;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use futures::TryStreamExt;
use sqlx::mysql::MySqlRow;
use sqlx::{Column, MySqlPool, Row, TypeInfo, ValueRef};

pub struct TargetRepository {
    pool: MySqlPool,
}

impl TargetRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TargetStore for TargetRepository {
    async fn column_data_type(
        &mut self,
        database: &str,
        table: &Identifier,
        column: &Identifier,
    ) -> Result<String> {
        let data_type: Option<String> = sqlx::query_scalar::<_, String>(
            r#"
            SELECT CAST(DATA_TYPE AS CHAR)
            FROM INFORMATION_SCHEMA.COLUMNS
            WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ? AND COLUMN_NAME = ?
            "#,
        )
        .bind(database)
        .bind(table.as_str())
        .bind(column.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ReconcileError::Query(format!("Failed to read data type of {}.{}: {}", table, column, e)))?;

        data_type.ok_or_else(|| {
            ReconcileError::NotFound(format!("column {} does not exist in {}.{}", column, database, table))
        })
    }

    async fn count_matching(&mut self, table: &Identifier, predicate: &Predicate) -> Result<u64> {
        let sql = predicate.count_sql(table);
        let count: i64 = predicate
            .bind(sqlx::query(&sql))
            .fetch_one(&self.pool)
            .await
            .and_then(|row| row.try_get(0))
            .map_err(|e| ReconcileError::Query(format!("Failed to count rows in {}: {}", table, e)))?;

        u64::try_from(count)
            .map_err(|_| ReconcileError::Query(format!("Negative row count {} from {}", count, table)))
    }

    async fn export_matching(
        &mut self,
        table: &Identifier,
        predicate: &Predicate,
        sink: &mut dyn RowSink,
    ) -> Result<u64> {
        let sql = predicate.select_sql(table);
        let mut rows = predicate.bind(sqlx::query(&sql)).fetch(&self.pool);

        let mut columns: Option<Vec<String>> = None;
        let mut exported = 0u64;

        while let Some(row) = rows
            .try_next()
            .await
            .map_err(|e| ReconcileError::Query(format!("Failed to read rows from {}: {}", table, e)))?
        {
            let names = columns.get_or_insert_with(|| {
                row.columns().iter().map(|c| c.name().to_string()).collect()
            });
            let values = decode_row(&row)
                .map_err(|e| ReconcileError::Query(format!("Failed to decode row from {}: {}", table, e)))?;

            sink.write_row(names, &values)?;
            exported += 1;
        }

        Ok(exported)
    }

    async fn delete_matching(&mut self, table: &Identifier, predicate: &Predicate) -> Result<u64> {
        let sql = predicate.delete_sql(table);
        let result = predicate
            .bind(sqlx::query(&sql))
            .execute(&self.pool)
            .await
            .map_err(|e| ReconcileError::Query(format!("Failed to delete rows from {}: {}", table, e)))?;

        Ok(result.rows_affected())
    }

    async fn close(&mut self) {
        self.pool.close().await;
    }
}

fn decode_row(row: &MySqlRow) -> std::result::Result<Vec<SqlValue>, sqlx::Error> {
    (0..row.len()).map(|index| decode_value(row, index)).collect()
}

/// Decode one column by its server-reported type. The dispatch picks the Rust type,
/// so the compatibility check is skipped.
fn decode_value(row: &MySqlRow, index: usize) -> std::result::Result<SqlValue, sqlx::Error> {
    let type_name = {
        let raw = row.try_get_raw(index)?;
        if raw.is_null() {
            return Ok(SqlValue::Null);
        }
        raw.type_info().name().to_ascii_uppercase()
    };

    let value = match type_name.as_str() {
        "NULL" => SqlValue::Null,
        name if name.ends_with("UNSIGNED") || name == "BIT" => {
            SqlValue::UInt(row.try_get_unchecked::<u64, _>(index)?)
        }
        "BOOLEAN" | "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" | "YEAR" => {
            SqlValue::Int(row.try_get_unchecked::<i64, _>(index)?)
        }
        "FLOAT" => SqlValue::Float(f64::from(row.try_get_unchecked::<f32, _>(index)?)),
        "DOUBLE" => SqlValue::Float(row.try_get_unchecked::<f64, _>(index)?),
        "DECIMAL" => SqlValue::Decimal(row.try_get_unchecked::<String, _>(index)?),
        "DATETIME" | "TIMESTAMP" => SqlValue::DateTime(row.try_get_unchecked::<NaiveDateTime, _>(index)?),
        "DATE" => SqlValue::Date(row.try_get_unchecked::<NaiveDate, _>(index)?),
        "TIME" => SqlValue::Time(row.try_get_unchecked::<NaiveTime, _>(index)?),
        "BLOB" | "TINYBLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BINARY" | "VARBINARY" | "GEOMETRY" => {
            SqlValue::Bytes(row.try_get_unchecked::<Vec<u8>, _>(index)?)
        }
        _ => SqlValue::Text(row.try_get_unchecked::<String, _>(index)?),
    };

    Ok(value)
}
