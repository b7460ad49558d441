//! Command implementations for the pipewise CLI

pub mod jobs;
pub mod manage;
pub mod serve;

pub use jobs::run_jobs;
pub use manage::run_manage;
pub use serve::run_serve;

use anyhow::{bail, Context, Result};
use pipewise_core::Settings;
use pipewise_server::pool_from_settings;
use sqlx::PgPool;

/// Connect with the configured URL, or fail with a hint on where to set it.
pub(crate) async fn connect(settings: &Settings) -> Result<PgPool> {
    if settings.database.url.is_none() {
        bail!("DATABASE_URL not set. Set via --database-url, DATABASE_URL env, .env or pipewise.toml");
    }
    pool_from_settings(&settings.database)
        .await
        .context("Failed to create database pool")
}
