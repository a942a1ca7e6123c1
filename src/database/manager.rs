use std::sync::OnceLock;
use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;
use tracing::info;

use crate::config;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Database pool accessed before initialization")]
    NotInitialized,

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

static POOL: OnceLock<PgPool> = OnceLock::new();

/// Process-wide database connection: initialized once at startup, closed by
/// an explicit shutdown hook, never visible before `init` completes.
pub struct Db;

impl Db {
    /// Connect, run pending migrations, and publish the pool. Called once
    /// from `main` before the server starts accepting requests.
    pub async fn init() -> Result<(), DatabaseError> {
        let url = std::env::var("DATABASE_URL")
            .map_err(|_| DatabaseError::ConfigMissing("DATABASE_URL"))?;

        let db_config = &config::config().database;
        let pool = PgPoolOptions::new()
            .max_connections(db_config.max_connections)
            .acquire_timeout(Duration::from_secs(db_config.connection_timeout_secs))
            .connect(&url)
            .await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| DatabaseError::Migration(e.to_string()))?;

        // First init wins; a second call is a startup bug but harmless
        let _ = POOL.set(pool);
        info!("Database pool initialized");
        Ok(())
    }

    pub fn pool() -> Result<&'static PgPool, DatabaseError> {
        POOL.get().ok_or(DatabaseError::NotInitialized)
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check() -> Result<(), DatabaseError> {
        let pool = Self::pool()?;
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    }

    /// Shutdown hook: drain and close the pool
    pub async fn close() {
        if let Some(pool) = POOL.get() {
            pool.close().await;
            info!("Database pool closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_access_before_init_fails() {
        // Tests run without a live database; the pool must refuse access
        // rather than panic
        assert!(matches!(Db::pool(), Err(DatabaseError::NotInitialized)));
    }
}
