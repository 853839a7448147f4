//! Database connection management using sqlx

use crate::config::Config;
use crate::db::mapping_repo::MappingRepository;
use crate::db::store::{Connector, TargetKey};
use crate::db::target_repo::TargetRepository;
use crate::error::{ReconcileError, Result};
use crate::identifier::Identifier;
use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};
use std::time::Duration;

/// Open a single-connection pool and check it answers.
pub async fn init_pool(
    options: MySqlConnectOptions,
    acquire_timeout: Duration,
) -> std::result::Result<MySqlPool, sqlx::Error> {
    let pool = MySqlPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(acquire_timeout)
        .connect_with(options)
        .await?;

    // Test the connection
    sqlx::query("SELECT 1").execute(&pool).await?;

    Ok(pool)
}

/// Split `host:port`, falling back to `default_port` when no port is given.
pub fn split_host_port(host: &str, default_port: u16) -> (&str, u16) {
    // `[addr]` or `[addr]:port` for IPv6
    if let Some(rest) = host.strip_prefix('[') {
        return match rest.split_once(']') {
            Some((addr, "")) if !addr.is_empty() => (addr, default_port),
            Some((addr, port)) if !addr.is_empty() => match port.strip_prefix(':').map(str::parse::<u16>) {
                Some(Ok(port)) => (addr, port),
                _ => (host, default_port),
            },
            _ => (host, default_port),
        };
    }

    match host.rsplit_once(':') {
        // A bare IPv6 address has colons of its own and no port
        Some((name, _)) if name.contains(':') => (host, default_port),
        Some((name, port)) if !name.is_empty() => match port.parse::<u16>() {
            Ok(port) => (name, port),
            Err(_) => (host, default_port),
        },
        _ => (host, default_port),
    }
}

/// Connector for MySQL mapping and target databases
pub struct MySqlConnector {
    config: Config,
}

impl MySqlConnector {
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Connector for MySqlConnector {
    type Mapping = MappingRepository;
    type Target = TargetRepository;

    async fn connect_mapping(&self) -> Result<MappingRepository> {
        let db = &self.config.history_archive_db;
        let options = MySqlConnectOptions::new()
            .host(&db.host)
            .port(db.port)
            .username(&db.username)
            .password(&db.password)
            .database(&db.database);

        let pool = init_pool(options, self.config.acquire_timeout())
            .await
            .map_err(|e| {
                ReconcileError::Connection(format!(
                    "Failed to connect to mapping database {}:{}/{}: {}",
                    db.host, db.port, db.database, e
                ))
            })?;

        Ok(MappingRepository::new(pool, self.config.mapping_table()?))
    }

    async fn connect_target(&self, key: &TargetKey) -> Result<TargetRepository> {
        let database = Identifier::parse(&key.database)?;
        let defaults = &self.config.target_db_defaults;
        let (host, port) = split_host_port(&key.host, defaults.port);

        let options = MySqlConnectOptions::new()
            .host(host)
            .port(port)
            .username(&defaults.username)
            .password(&defaults.password)
            .database(database.as_str());

        let pool = init_pool(options, self.config.acquire_timeout())
            .await
            .map_err(|e| {
                ReconcileError::Connection(format!("Failed to connect to target database {}: {}", key, e))
            })?;

        Ok(TargetRepository::new(pool))
    }
}
