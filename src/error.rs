use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Lookup error: {0}")]
    Lookup(String),

    #[error("Unsupported column type '{data_type}' for column {column}")]
    UnsupportedType { column: String, data_type: String },

    #[error("Invalid condition '{condition}': {reason}")]
    InvalidCondition { condition: String, reason: String },

    #[error("Invalid identifier '{0}': only letters, digits and underscores are allowed")]
    InvalidIdentifier(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Task file line {line}: {message}")]
    TaskFile { line: u64, message: String },
}

impl ReconcileError {
    /// Wraps an IO failure with the operation that hit it.
    pub fn io(operation: impl std::fmt::Display, err: std::io::Error) -> Self {
        ReconcileError::Io(format!("{}: {}", operation, err))
    }
}

pub type Result<T> = std::result::Result<T, ReconcileError>;
