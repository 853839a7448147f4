//! In-memory mapping and target stores that record every statement they receive

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use recon_archiver::db::{Connector, MappingStore, RowSink, TargetKey, TargetStore};
use recon_archiver::identifier::Identifier;
use recon_archiver::predicate::{Filter, Predicate, LIKE_ESCAPE};
use recon_archiver::value::SqlValue;
use recon_archiver::{ReconcileError, ReconciliationTask, Result};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, Default)]
pub struct FakeTable {
    pub column_types: HashMap<String, String>,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<SqlValue>>,
}

impl FakeTable {
    pub fn new(columns: &[(&str, &str)]) -> Self {
        Self {
            column_types: columns
                .iter()
                .map(|(name, ty)| (name.to_string(), ty.to_string()))
                .collect(),
            columns: columns.iter().map(|(name, _)| name.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn with_row(mut self, row: Vec<SqlValue>) -> Self {
        self.rows.push(row);
        self
    }

    fn matches(&self, predicate: &Predicate, row: &[SqlValue]) -> bool {
        let Some(index) = self.columns.iter().position(|c| c == predicate.column().as_str()) else {
            return false;
        };

        match (predicate.filter(), &row[index]) {
            (Filter::Prefix(_), SqlValue::Text(text)) => predicate
                .like_pattern()
                .is_some_and(|pattern| like_matches(&pattern, text)),
            (Filter::DayWindow { start, end }, SqlValue::DateTime(at)) => at >= start && at < end,
            (Filter::DayWindow { start, end }, SqlValue::Date(day)) => {
                let midnight = day.and_hms_opt(0, 0, 0).unwrap();
                midnight >= *start && midnight < *end
            }
            _ => false,
        }
    }
}

enum LikeToken {
    Literal(char),
    AnyOne,
    AnyRun,
}

/// Evaluates a bound LIKE pattern the way the server does, with `LIKE_ESCAPE` as escape.
pub fn like_matches(pattern: &str, text: &str) -> bool {
    let mut tokens = Vec::new();
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        tokens.push(match c {
            c if c == LIKE_ESCAPE => LikeToken::Literal(chars.next().unwrap_or(c)),
            '%' => LikeToken::AnyRun,
            '_' => LikeToken::AnyOne,
            c => LikeToken::Literal(c),
        });
    }
    let text: Vec<char> = text.chars().collect();
    match_tokens(&tokens, &text)
}

fn match_tokens(tokens: &[LikeToken], text: &[char]) -> bool {
    match tokens.split_first() {
        None => text.is_empty(),
        Some((LikeToken::AnyRun, rest)) => (0..=text.len()).any(|skip| match_tokens(rest, &text[skip..])),
        Some((LikeToken::AnyOne, rest)) => !text.is_empty() && match_tokens(rest, &text[1..]),
        Some((LikeToken::Literal(c), rest)) => text.first() == Some(c) && match_tokens(rest, &text[1..]),
    }
}

#[derive(Debug, Default)]
pub struct FakeWorld {
    /// (db prefix, table prefix) -> archive column
    pub mapping: HashMap<(String, String), String>,
    /// (host, database, table) -> table
    pub tables: HashMap<(String, String, String), FakeTable>,
    pub statements: Vec<String>,
    pub connects: Vec<String>,
    pub down_hosts: HashSet<String>,
    pub fail_count: bool,
    pub fail_delete: bool,
    /// Fail the export after this many rows were streamed
    pub fail_export_after: Option<usize>,
}

#[derive(Clone, Default)]
pub struct Shared(Arc<Mutex<FakeWorld>>);

impl Shared {
    pub fn lock(&self) -> MutexGuard<'_, FakeWorld> {
        self.0.lock().unwrap()
    }

    pub fn map(&self, db_prefix: &str, table_prefix: &str, column: &str) {
        self.lock()
            .mapping
            .insert((db_prefix.to_string(), table_prefix.to_string()), column.to_string());
    }

    pub fn add_table(&self, host: &str, database: &str, table: &str, contents: FakeTable) {
        self.lock()
            .tables
            .insert((host.to_string(), database.to_string(), table.to_string()), contents);
    }

    pub fn table(&self, host: &str, database: &str, table: &str) -> FakeTable {
        self.lock()
            .tables
            .get(&(host.to_string(), database.to_string(), table.to_string()))
            .cloned()
            .unwrap()
    }

    pub fn statements(&self) -> Vec<String> {
        self.lock().statements.clone()
    }

    /// Statements that touched a target table's rows
    pub fn table_statements(&self) -> Vec<String> {
        self.statements()
            .into_iter()
            .filter(|s| s.starts_with("count") || s.starts_with("select") || s.starts_with("delete"))
            .collect()
    }

    pub fn connector(&self) -> FakeConnector {
        FakeConnector(self.clone())
    }
}

pub struct FakeConnector(pub Shared);

pub struct FakeMapping(Shared);

pub struct FakeTarget {
    world: Shared,
    key: TargetKey,
}

impl FakeTarget {
    fn table_key(&self, table: &Identifier) -> (String, String, String) {
        (self.key.host.clone(), self.key.database.clone(), table.to_string())
    }
}

#[async_trait]
impl Connector for FakeConnector {
    type Mapping = FakeMapping;
    type Target = FakeTarget;

    async fn connect_mapping(&self) -> Result<FakeMapping> {
        Ok(FakeMapping(self.0.clone()))
    }

    async fn connect_target(&self, key: &TargetKey) -> Result<FakeTarget> {
        let mut world = self.0.lock();
        if world.down_hosts.contains(&key.host) {
            return Err(ReconcileError::Connection(format!("{} refused the connection", key)));
        }
        world.connects.push(key.to_string());
        Ok(FakeTarget {
            world: self.0.clone(),
            key: key.clone(),
        })
    }
}

#[async_trait]
impl MappingStore for FakeMapping {
    async fn archive_column(&mut self, db_prefix: &str, table_prefix: &str) -> Result<Option<String>> {
        let mut world = self.0.lock();
        world.statements.push(format!("lookup {}/{}", db_prefix, table_prefix));
        Ok(world
            .mapping
            .get(&(db_prefix.to_string(), table_prefix.to_string()))
            .cloned())
    }
}

#[async_trait]
impl TargetStore for FakeTarget {
    async fn column_data_type(
        &mut self,
        database: &str,
        table: &Identifier,
        column: &Identifier,
    ) -> Result<String> {
        let key = self.table_key(table);
        let mut world = self.world.lock();
        world
            .statements
            .push(format!("type {}.{}.{}", database, table, column));
        world
            .tables
            .get(&key)
            .and_then(|t| t.column_types.get(column.as_str()).cloned())
            .ok_or_else(|| ReconcileError::NotFound(format!("column {} not found", column)))
    }

    async fn count_matching(&mut self, table: &Identifier, predicate: &Predicate) -> Result<u64> {
        let key = self.table_key(table);
        let mut world = self.world.lock();
        world.statements.push(format!("count {}", table));
        if world.fail_count {
            return Err(ReconcileError::Query("count timed out".to_string()));
        }
        let contents = world.tables.get(&key).cloned().unwrap_or_default();
        Ok(contents
            .rows
            .iter()
            .filter(|row| contents.matches(predicate, row))
            .count() as u64)
    }

    async fn export_matching(
        &mut self,
        table: &Identifier,
        predicate: &Predicate,
        sink: &mut dyn RowSink,
    ) -> Result<u64> {
        let key = self.table_key(table);
        let (contents, fail_after) = {
            let mut world = self.world.lock();
            world.statements.push(format!("select {}", table));
            (world.tables.get(&key).cloned().unwrap_or_default(), world.fail_export_after)
        };

        let mut written = 0u64;
        for row in contents.rows.iter().filter(|row| contents.matches(predicate, row)) {
            if fail_after == Some(written as usize) {
                return Err(ReconcileError::Query("connection lost mid-stream".to_string()));
            }
            sink.write_row(&contents.columns, row)?;
            written += 1;
        }
        Ok(written)
    }

    async fn delete_matching(&mut self, table: &Identifier, predicate: &Predicate) -> Result<u64> {
        let key = self.table_key(table);
        let mut world = self.world.lock();
        world.statements.push(format!("delete {}", table));
        if world.fail_delete {
            return Err(ReconcileError::Query("lock wait timeout exceeded".to_string()));
        }
        let Some(contents) = world.tables.get_mut(&key) else {
            return Ok(0);
        };
        let before = contents.rows.len();
        let kept: Vec<Vec<SqlValue>> = contents
            .rows
            .iter()
            .filter(|row| !contents.matches(predicate, row))
            .cloned()
            .collect();
        contents.rows = kept;
        Ok((before - contents.rows.len()) as u64)
    }
}

pub fn at(day: u32, hour: u32) -> SqlValue {
    SqlValue::DateTime(
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap(),
    )
}

pub fn task(host: &str, database: &str, table: &str, condition: &str, expected: u64) -> ReconciliationTask {
    ReconciliationTask {
        target_host: host.to_string(),
        database_name: database.to_string(),
        table_name: table.to_string(),
        search_condition: condition.to_string(),
        expected_row_count: expected,
    }
}

/// `shop_01.orders_02` on `db1.host`: five orders on 2024-01-15 and two on neighbouring days.
pub fn orders_world() -> Shared {
    let world = Shared::default();
    world.map("shop", "orders", "created_at");

    let mut orders = FakeTable::new(&[("id", "bigint"), ("note", "varchar"), ("created_at", "datetime")]);
    let times = [at(14, 23), at(15, 0), at(15, 6), at(15, 12), at(15, 18), at(15, 23), at(16, 0)];
    for (id, created_at) in times.into_iter().enumerate() {
        let note = if id == 2 {
            SqlValue::Null
        } else {
            SqlValue::Text(format!("order '{}'", id))
        };
        orders = orders.with_row(vec![SqlValue::Int(id as i64 + 1), note, created_at]);
    }
    world.add_table("db1.host", "shop_01", "orders_02", orders);
    world
}
