//! Entity services
//!
//! A service method is one unit of work: it opens a transaction on the
//! pool, runs repositories against it and commits. Returning early with
//! `?` drops the transaction, which rolls it back.
//!
//! Services also derive slugs. Inserts of slugged rows go through
//! [`insert_with_unique_slug`], which resolves a free slug, inserts inside
//! a savepoint and retries with a fresh slug when a concurrent writer took
//! it first.

pub mod companies;
pub mod icps;
pub mod job_posts;
pub mod opportunities;
pub mod people;
pub mod tags;
pub mod teams;
pub mod tenants;
pub mod users;

use std::borrow::Cow;

use async_trait::async_trait;
use pipewise_core::{Scope, TenantId, ValidationError};
use sqlx::{Connection, PgConnection};
use uuid::Uuid;

use crate::auth::AuthError;
use crate::db::slugs::{available_slug, SlugTable};
use crate::db::DbError;

pub use companies::CompanyService;
pub use icps::IcpService;
pub use job_posts::JobPostService;
pub use opportunities::OpportunityService;
pub use people::PersonService;
pub use tags::TagService;
pub use teams::TeamService;
pub use tenants::TenantService;
pub use users::UserService;

/// Attempts before a slug race is reported as a conflict.
pub const MAX_SLUG_ATTEMPTS: usize = 5;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        Self::Db(err.into())
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Who a service call acts for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub tenant: TenantId,
    /// `None` for system-initiated work (CLI, imports).
    pub user_id: Option<Uuid>,
}

impl Actor {
    pub fn user(tenant: TenantId, user_id: Uuid) -> Self {
        Self {
            tenant,
            user_id: Some(user_id),
        }
    }

    pub fn system(tenant: TenantId) -> Self {
        Self {
            tenant,
            user_id: None,
        }
    }
}

/// A row insert keyed by a slug.
#[async_trait]
pub trait SlugInsert: Sync {
    type Output: Send;

    const TABLE: SlugTable;

    /// Text the slug is derived from.
    fn slug_source(&self) -> Cow<'_, str>;

    /// Slug supplied by the caller, used as is.
    fn requested_slug(&self) -> Option<&str>;

    async fn insert(&self, conn: &mut PgConnection, slug: &str) -> Result<Self::Output, DbError>;
}

/// Insert `item` under a slug unique within `scope`.
///
/// A caller-supplied slug is inserted once; taking an existing one is a
/// [`DbError::Conflict`]. A derived slug is recomputed and retried inside a
/// savepoint on each slug conflict, up to [`MAX_SLUG_ATTEMPTS`] times.
pub async fn insert_with_unique_slug<T: SlugInsert>(
    conn: &mut PgConnection,
    scope: Scope,
    item: &T,
) -> Result<T::Output, DbError> {
    if let Some(slug) = item.requested_slug() {
        return item.insert(conn, slug).await;
    }

    let constraint = T::TABLE.constraint();
    for attempt in 1..=MAX_SLUG_ATTEMPTS {
        let slug = available_slug(&mut *conn, T::TABLE, &item.slug_source(), scope, None).await?;
        let mut savepoint = conn.begin().await?;
        match item.insert(&mut savepoint, &slug).await {
            Ok(output) => {
                savepoint.commit().await?;
                return Ok(output);
            }
            Err(err) if err.is_conflict_on(constraint) => {
                savepoint.rollback().await?;
                tracing::warn!(table = T::TABLE.table(), %slug, attempt, "slug taken concurrently, retrying");
            }
            Err(err) => return Err(err),
        }
    }

    Err(DbError::Conflict {
        constraint: constraint.to_string(),
    })
}

/// Slug to store on update, if it changes.
///
/// An explicit slug wins. Otherwise a new slug is derived only when the
/// name changes; the row's own slug does not count as taken.
pub async fn slug_for_update(
    conn: &mut PgConnection,
    table: SlugTable,
    scope: Scope,
    id: Uuid,
    current_name: &str,
    new_name: Option<&str>,
    requested: Option<&str>,
) -> Result<Option<String>, DbError> {
    if let Some(slug) = requested {
        return Ok(Some(slug.to_string()));
    }
    match new_name {
        Some(name) if name != current_name => {
            available_slug(conn, table, name, scope, Some(id)).await.map(Some)
        }
        _ => Ok(None),
    }
}
