//! Storage: repository traits with in-memory and PostgreSQL implementations.

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::{sync::Arc, time::Duration};

pub mod config;
pub mod errors;
pub mod memory;
pub mod postgres;
pub mod repository;

pub use config::DatabaseConfig;
pub use errors::{StorageError, StorageResult};
pub use memory::{
    MemoryClockRepository, MemoryConfigRepository, MemoryLedgerRepository, MemoryTableRepository,
};
pub use postgres::{PgClockRepository, PgConfigRepository, PgLedgerRepository, PgTableRepository};
pub use repository::{ClockRepository, ConfigRepository, LedgerRepository, TableRepository};

/// Engine schema; every statement is idempotent
const SCHEMA: &str = include_str!("../../migrations/001_tournament_engine.sql");

/// Database connection pool wrapper
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use tourney::db::{Database, DatabaseConfig};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let config = DatabaseConfig::from_env()?;
    ///     let db = Database::new(&config).await?;
    ///     db.health_check().await?;
    ///     Ok(())
    /// }
    /// ```
    pub async fn new(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
            .connect(&config.database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check if the database connection is healthy
    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Create the engine's tables if they do not exist yet
    pub async fn apply_schema(&self) -> Result<(), sqlx::Error> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }

    /// Close the database connection pool
    pub async fn close(self) {
        self.pool.close().await;
    }
}

/// The repositories an engine runs against
#[derive(Clone)]
pub struct Repositories {
    pub clocks: Arc<dyn ClockRepository>,
    pub configs: Arc<dyn ConfigRepository>,
    pub ledger: Arc<dyn LedgerRepository>,
    pub tables: Arc<dyn TableRepository>,
}

impl Repositories {
    /// Fresh in-memory storage
    pub fn in_memory() -> Self {
        Self {
            clocks: Arc::new(MemoryClockRepository::new()),
            configs: Arc::new(MemoryConfigRepository::new()),
            ledger: Arc::new(MemoryLedgerRepository::new()),
            tables: Arc::new(MemoryTableRepository::new()),
        }
    }

    /// PostgreSQL storage sharing one pool
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            clocks: Arc::new(PgClockRepository::new(pool.clone())),
            configs: Arc::new(PgConfigRepository::new(pool.clone())),
            ledger: Arc::new(PgLedgerRepository::new(pool.clone())),
            tables: Arc::new(PgTableRepository::new(pool)),
        }
    }
}
