//! pipewise-server: multi-tenant CRM backend
//!
//! - [`db`]: pool, migrations, tenant-scoped repositories, slug lookups
//! - [`services`]: one transaction per operation, slug derivation, audit log
//! - [`http`]: axum routes, bearer-token sessions, JSON errors
//! - [`vite`]: script and stylesheet tags for the frontend build

pub mod auth;
pub mod db;
pub mod http;
pub mod models;
pub mod services;
pub mod vite;

pub use db::{create_pool, create_pool_with_options, pool_from_settings, DbError, MIGRATOR};
pub use http::{build_router, run_server, ApiError, AppState, ServerConfig, ServerError};
pub use services::{ServiceError, ServiceResult};
