//! Run configuration
//!
//! Loaded from a JSON file. Passwords may be supplied through the environment
//! (or a `.env` file) instead of the file itself.

use crate::error::{ReconcileError, Result};
use crate::identifier::Identifier;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const MAPPING_PASSWORD_ENV: &str = "RECON_HISTORY_DB_PASSWORD";
pub const TARGET_PASSWORD_ENV: &str = "RECON_TARGET_DB_PASSWORD";

const DEFAULT_MYSQL_PORT: u16 = 3306;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Database holding the archive column mapping table
    pub history_archive_db: MappingDbConfig,

    /// Credentials used for every target database
    pub target_db_defaults: TargetDbConfig,

    /// Directory receiving backup files
    pub backup_dir: PathBuf,

    /// Seconds to wait for a pooled connection
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MappingDbConfig {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub database: String,
    /// Mapping table with `db_name_pre`, `table_name_pre`, `archive_column_name`
    pub table: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TargetDbConfig {
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Used when a task's host has no explicit `:port`
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    DEFAULT_MYSQL_PORT
}

fn default_acquire_timeout_secs() -> u64 {
    30
}

impl Config {
    /// Load, apply environment overrides, and validate
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ReconcileError::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        let mut config = Self::from_json(&text)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| ReconcileError::Config(format!("Failed to parse config: {}", e)))
    }

    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(password) = lookup(MAPPING_PASSWORD_ENV) {
            self.history_archive_db.password = password;
        }
        if let Some(password) = lookup(TARGET_PASSWORD_ENV) {
            self.target_db_defaults.password = password;
        }
    }

    pub fn validate(&self) -> Result<()> {
        let db = &self.history_archive_db;
        if db.host.trim().is_empty() {
            return Err(ReconcileError::Config("history_archive_db.host is empty".to_string()));
        }
        if db.database.trim().is_empty() {
            return Err(ReconcileError::Config("history_archive_db.database is empty".to_string()));
        }
        self.mapping_table()?;
        if self.backup_dir.as_os_str().is_empty() {
            return Err(ReconcileError::Config("backup_dir is empty".to_string()));
        }
        Ok(())
    }

    pub fn mapping_table(&self) -> Result<Identifier> {
        Identifier::parse(&self.history_archive_db.table).map_err(|e| {
            ReconcileError::Config(format!("history_archive_db.table: {}", e))
        })
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }
}
