//! Type-aware predicate construction
//!
//! The archive column's declared type decides how the search condition is applied:
//! string-like columns get a prefix match, date-like columns get a one-day window.
//! Counting, backup export and deletion all render their WHERE clause and bind their
//! parameters through [`Predicate`], so the three statements always select the same rows.

use crate::error::{ReconcileError, Result};
use crate::identifier::Identifier;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use sqlx::mysql::{MySql, MySqlArguments};
use sqlx::query::Query;

const STRING_TYPES: &[&str] = &["varchar", "char", "text", "longtext", "mediumtext", "tinytext"];
const DATETIME_TYPES: &[&str] = &["datetime", "timestamp", "date", "time"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    StringLike,
    DateTimeLike,
    Unsupported,
}

/// Classify a declared SQL type name. Case-insensitive substring match, string-like first.
pub fn classify_type(raw_type: &str) -> ColumnType {
    let lowered = raw_type.to_lowercase();

    if STRING_TYPES.iter().any(|t| lowered.contains(t)) {
        ColumnType::StringLike
    } else if DATETIME_TYPES.iter().any(|t| lowered.contains(t)) {
        ColumnType::DateTimeLike
    } else {
        ColumnType::Unsupported
    }
}

/// How the archive column is filtered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// Column starts with the given text.
    Prefix(String),
    /// Column falls in `[start, end)`.
    DayWindow { start: NaiveDateTime, end: NaiveDateTime },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    column: Identifier,
    filter: Filter,
}

/// Build the predicate for `column` given its classification and the task's condition.
pub fn build_predicate(
    column: &Identifier,
    column_type: ColumnType,
    raw_type: &str,
    condition: &str,
) -> Result<Predicate> {
    let filter = match column_type {
        ColumnType::StringLike => Filter::Prefix(condition.to_string()),
        ColumnType::DateTimeLike => {
            let start = parse_day(condition)?;
            Filter::DayWindow {
                start,
                end: start + Duration::days(1),
            }
        }
        ColumnType::Unsupported => {
            return Err(ReconcileError::UnsupportedType {
                column: column.to_string(),
                data_type: raw_type.to_string(),
            })
        }
    };

    Ok(Predicate {
        column: column.clone(),
        filter,
    })
}

fn parse_day(condition: &str) -> Result<NaiveDateTime> {
    let invalid = |reason: &str| ReconcileError::InvalidCondition {
        condition: condition.to_string(),
        reason: reason.to_string(),
    };

    if condition.len() != 8 || !condition.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid("expected an 8-digit YYYYMMDD date"));
    }

    let day = NaiveDate::parse_from_str(condition, "%Y%m%d")
        .map_err(|_| invalid("not a calendar date"))?;

    day.and_hms_opt(0, 0, 0).ok_or_else(|| invalid("not a calendar date"))
}

/// Escape character named in every LIKE clause. Independent of `NO_BACKSLASH_ESCAPES`.
pub const LIKE_ESCAPE: char = '!';

/// Escape LIKE metacharacters so the condition matches literally.
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len() + 1);
    for c in value.chars() {
        if c == LIKE_ESCAPE || c == '%' || c == '_' {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(c);
    }
    escaped
}

impl Predicate {
    pub fn column(&self) -> &Identifier {
        &self.column
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    /// WHERE clause body with `?` placeholders.
    pub fn where_clause(&self) -> String {
        let column = self.column.quoted();
        match &self.filter {
            Filter::Prefix(_) => format!("{} LIKE ? ESCAPE '{}'", column, LIKE_ESCAPE),
            Filter::DayWindow { .. } => format!("{} >= ? AND {} < ?", column, column),
        }
    }

    /// The LIKE pattern bound for a prefix filter.
    pub fn like_pattern(&self) -> Option<String> {
        match &self.filter {
            Filter::Prefix(prefix) => Some(format!("{}%", escape_like(prefix))),
            Filter::DayWindow { .. } => None,
        }
    }

    /// Bind the condition values in placeholder order.
    pub fn bind<'q>(
        &self,
        query: Query<'q, MySql, MySqlArguments>,
    ) -> Query<'q, MySql, MySqlArguments> {
        match &self.filter {
            Filter::Prefix(_) => query.bind(self.like_pattern()),
            Filter::DayWindow { start, end } => query.bind(*start).bind(*end),
        }
    }

    pub fn count_sql(&self, table: &Identifier) -> String {
        format!("SELECT COUNT(*) FROM {} WHERE {}", table.quoted(), self.where_clause())
    }

    pub fn select_sql(&self, table: &Identifier) -> String {
        format!("SELECT * FROM {} WHERE {}", table.quoted(), self.where_clause())
    }

    pub fn delete_sql(&self, table: &Identifier) -> String {
        format!("DELETE FROM {} WHERE {}", table.quoted(), self.where_clause())
    }
}
