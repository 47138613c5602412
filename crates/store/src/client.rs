//! SQLite pool wrapper.

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::{Sqlite, SqlitePool, Transaction};
use stats_core::{Error, Result};
use tracing::info;

use crate::config::DatabaseConfig;
use crate::error::db_error;
use crate::schema::init_schema;

/// Handle to the statistics database.
#[derive(Clone)]
pub struct StatsDb {
    pool: SqlitePool,
    config: DatabaseConfig,
}

impl StatsDb {
    /// Opens (creating if missing) the database and applies the schema.
    pub async fn connect(config: DatabaseConfig) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&config.url)
            .map_err(|e| Error::config(format!("invalid database url {:?}: {e}", config.url)))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(config.busy_timeout_secs));

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .connect_with(options)
            .await
            .map_err(|e| db_error(e, "open database"))?;

        init_schema(&pool).await?;

        info!(
            url = %config.url,
            max_connections = config.max_connections,
            "Opened statistics database"
        );

        Ok(Self { pool, config })
    }

    /// Opens a private in-memory database with the schema applied.
    ///
    /// The pool holds exactly one connection that is never recycled, since
    /// closing it would discard the data.
    pub async fn in_memory() -> Result<Self> {
        let config = DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            ..Default::default()
        };
        let options = SqliteConnectOptions::from_str(&config.url)
            .map_err(|e| Error::config(format!("invalid database url: {e}")))?;

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| db_error(e, "open in-memory database"))?;

        init_schema(&pool).await?;

        Ok(Self { pool, config })
    }

    /// Returns the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Returns the configuration.
    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Starts a write transaction.
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>> {
        self.pool
            .begin()
            .await
            .map_err(|e| db_error(e, "begin transaction"))
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
