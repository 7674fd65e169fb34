//! Postgres pool setup and schema bootstrap.

use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::config::DatabaseConfig;
use crate::repository::RepositoryError;

const SCHEMA: &str = include_str!("../migrations/0001_catalog.sql");

pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, RepositoryError> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(&config.url)
        .await
        .map_err(|e| RepositoryError::Unavailable(format!("connect: {e}")))
}

/// Create the catalog tables if they are missing. Idempotent.
pub async fn migrate(pool: &PgPool) -> Result<(), RepositoryError> {
    sqlx::raw_sql(SCHEMA)
        .execute(pool)
        .await
        .map_err(|e| RepositoryError::Database {
            operation: "migrate",
            message: e.to_string(),
        })?;
    tracing::info!("catalog schema ready");
    Ok(())
}
