//! Database layer - connection pool, migrations and repositories
//!
//! # Design Principles
//!
//! - Connection pool (default 5 connections) - no Arc<Mutex<Connection>>
//! - Repositories borrow a connection; services own the transaction
//! - Tenant-owned tables are only reachable through [`scope::ScopedQuery`]
//!   or an explicit `tenant_id` predicate
//! - Rely on DB constraints, classify conflicts - no check-then-insert

pub mod error;
pub mod pool;
pub mod repos;
pub mod scope;
pub mod slugs;

pub use error::DbError;
pub use pool::{create_pool, create_pool_with_options, pool_from_settings};

/// Embedded, reversible schema migrations.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../migrations");
