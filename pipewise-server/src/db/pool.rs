//! Postgres pool construction
//!
//! One pool per process. Connections are checked out per transaction by the
//! services and returned on commit or drop.

use std::time::Duration;

use pipewise_core::config::DatabaseSettings;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Waiting longer than this for a free connection fails the request.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

fn options(max_connections: u32) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(max_connections.max(1))
        .acquire_timeout(ACQUIRE_TIMEOUT)
}

/// Pool with [`DEFAULT_MAX_CONNECTIONS`].
///
/// ```ignore
/// let pool = create_pool("postgres://localhost/pipewise").await?;
/// ```
pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    create_pool_with_options(database_url, DEFAULT_MAX_CONNECTIONS).await
}

pub async fn create_pool_with_options(
    database_url: &str,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    tracing::debug!(max_connections, "connecting to database");
    options(max_connections).connect(database_url).await
}

/// Pool from the `[database]` settings; the URL is required.
pub async fn pool_from_settings(settings: &DatabaseSettings) -> Result<PgPool, sqlx::Error> {
    let url = settings
        .url
        .as_deref()
        .ok_or_else(|| sqlx::Error::Configuration("DATABASE_URL is not set".into()))?;
    create_pool_with_options(url, settings.max_connections).await
}
