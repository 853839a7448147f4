//! Column values as read for backup, and their SQL literal form

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

const TEMPORAL_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Int(i64),
    UInt(u64),
    Float(f64),
    /// Exact numeric text as sent by the server (DECIMAL).
    Decimal(String),
    Text(String),
    Bytes(Vec<u8>),
    DateTime(NaiveDateTime),
    Date(NaiveDate),
    Time(NaiveTime),
}

impl SqlValue {
    /// Render as a literal usable in an INSERT statement.
    pub fn to_sql_literal(&self) -> String {
        match self {
            SqlValue::Null => "NULL".to_string(),
            SqlValue::Int(v) => v.to_string(),
            SqlValue::UInt(v) => v.to_string(),
            SqlValue::Float(v) => v.to_string(),
            SqlValue::Decimal(v) => v.clone(),
            SqlValue::Text(v) => quote(v),
            SqlValue::Bytes(v) => match std::str::from_utf8(v) {
                Ok(text) => quote(text),
                Err(_) => format!("X'{}'", hex::encode(v)),
            },
            SqlValue::DateTime(v) => quote(&v.format(TEMPORAL_FORMAT).to_string()),
            SqlValue::Date(v) => match v.and_hms_opt(0, 0, 0) {
                Some(midnight) => quote(&midnight.format(TEMPORAL_FORMAT).to_string()),
                None => quote(&v.to_string()),
            },
            SqlValue::Time(v) => quote(&v.format("%H:%M:%S").to_string()),
        }
    }
}

fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
