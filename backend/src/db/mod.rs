//! Database connection and pool management
//!
//! Only used when `storage.backend = "postgres"`. The pool backs
//! [`PgUserStore`](crate::repositories::PgUserStore).

use crate::config::StorageConfig;
use anyhow::{Context, Result};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

/// Pool settings derived from [`StorageConfig`]
#[derive(Debug, Clone)]
pub struct PoolSettings {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
}

impl PoolSettings {
    pub fn from_storage(storage: &StorageConfig) -> Result<Self> {
        let url = storage
            .database_url
            .clone()
            .context("storage.database_url is not set")?;

        Ok(Self {
            url,
            max_connections: storage.max_connections,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
        })
    }
}

/// Connect a PostgreSQL pool for the user store
pub async fn create_pool(settings: &PoolSettings) -> Result<PgPool> {
    let connect_options = PgConnectOptions::from_str(&settings.url)?
        .application_name("bac-tutor");

    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(settings.acquire_timeout)
        .idle_timeout(settings.idle_timeout)
        .test_before_acquire(true)
        .connect_with(connect_options)
        .await
        .context("failed to connect to the user database")?;

    info!(
        max = settings.max_connections,
        min = settings.min_connections,
        "Database pool created"
    );

    Ok(pool)
}

/// Create the `users` table if it does not exist yet
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("Database migrations completed successfully");
    Ok(())
}

/// Check database health
pub async fn health_check(pool: &PgPool) -> Result<()> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map(|_| ())
        .map_err(|e| {
            warn!(error = %e, "Database health check failed");
            e.into()
        })
}
