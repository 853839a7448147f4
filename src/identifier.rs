//! SQL identifier validation
//!
//! Table and column names are interpolated into statement text while values are
//! always bound as parameters. Every interpolated name goes through [`Identifier::parse`].

use crate::error::{ReconcileError, Result};
use std::fmt;

/// MySQL limit for table and column names.
const MAX_IDENTIFIER_LEN: usize = 64;

/// A validated table, column or schema name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier(String);

impl Identifier {
    pub fn parse(name: &str) -> Result<Self> {
        let valid = !name.is_empty()
            && name.len() <= MAX_IDENTIFIER_LEN
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');

        if !valid {
            return Err(ReconcileError::InvalidIdentifier(name.to_string()));
        }

        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Backtick-quoted form for statement text.
    pub fn quoted(&self) -> String {
        format!("`{}`", self.0)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Quotes a column name reported by the server. These are not validated since they
/// come back from the result set, so embedded backticks are doubled instead.
pub fn quote_result_column(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}
