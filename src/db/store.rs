//! Store traits the reconciler runs against
//!
//! The MySQL repositories implement these; tests substitute in-memory stores.

use crate::error::Result;
use crate::identifier::Identifier;
use crate::predicate::Predicate;
use crate::value::SqlValue;
use async_trait::async_trait;
use std::fmt;

/// Receives exported rows one at a time.
pub trait RowSink: Send {
    fn write_row(&mut self, columns: &[String], values: &[SqlValue]) -> Result<()>;
}

/// Read-only access to the archive column mapping table
#[async_trait]
pub trait MappingStore: Send {
    /// Archive column for the exact prefix pair. When the table holds duplicates,
    /// the first row the server returns wins.
    async fn archive_column(&mut self, db_prefix: &str, table_prefix: &str) -> Result<Option<String>>;

    async fn close(&mut self) {}
}

/// One target database
#[async_trait]
pub trait TargetStore: Send {
    /// Declared data type of `column`, from the catalog.
    async fn column_data_type(
        &mut self,
        database: &str,
        table: &Identifier,
        column: &Identifier,
    ) -> Result<String>;

    async fn count_matching(&mut self, table: &Identifier, predicate: &Predicate) -> Result<u64>;

    /// Stream every matching row (all columns) into `sink`. Returns rows written.
    async fn export_matching(
        &mut self,
        table: &Identifier,
        predicate: &Predicate,
        sink: &mut dyn RowSink,
    ) -> Result<u64>;

    /// Returns the affected row count.
    async fn delete_matching(&mut self, table: &Identifier, predicate: &Predicate) -> Result<u64>;

    async fn close(&mut self) {}
}

/// Cache key for target connections
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetKey {
    pub host: String,
    pub database: String,
}

impl TargetKey {
    pub fn new(host: &str, database: &str) -> Self {
        Self {
            host: host.to_string(),
            database: database.to_string(),
        }
    }
}

impl fmt::Display for TargetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.host, self.database)
    }
}

/// Opens mapping and target connections
#[async_trait]
pub trait Connector: Send + Sync {
    type Mapping: MappingStore;
    type Target: TargetStore;

    async fn connect_mapping(&self) -> Result<Self::Mapping>;

    async fn connect_target(&self, key: &TargetKey) -> Result<Self::Target>;
}
