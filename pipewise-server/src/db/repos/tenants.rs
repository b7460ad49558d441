//! Tenant repository
//!
//! Tenants are the isolation boundary itself, so their table is global.

use pipewise_core::{Scope, TenantId};
use sqlx::PgConnection;

use crate::db::scope::{fetch_page, ListQuery};
use crate::db::DbError;
use crate::models::{Paginated, Pagination, Tenant, TenantCreate, TenantUpdate};

const COLUMNS: &str = "id, name, description, url, is_active, slug, created_at, updated_at";

pub struct TenantRepo<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> TenantRepo<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    pub async fn insert(&mut self, input: &TenantCreate, slug: &str) -> Result<Tenant, DbError> {
        let tenant = sqlx::query_as::<_, Tenant>(&format!(
            "INSERT INTO tenant (name, description, url, is_active, slug) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {COLUMNS}"
        ))
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.url)
        .bind(input.is_active)
        .bind(slug)
        .fetch_one(&mut *self.conn)
        .await?;
        Ok(tenant)
    }

    pub async fn get(&mut self, id: TenantId) -> Result<Tenant, DbError> {
        sqlx::query_as::<_, Tenant>(&format!("SELECT {COLUMNS} FROM tenant WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.conn)
            .await?
            .ok_or_else(|| DbError::not_found("tenant", id))
    }

    pub async fn get_by_slug(&mut self, slug: &str) -> Result<Tenant, DbError> {
        sqlx::query_as::<_, Tenant>(&format!("SELECT {COLUMNS} FROM tenant WHERE slug = $1"))
            .bind(slug)
            .fetch_optional(&mut *self.conn)
            .await?
            .ok_or_else(|| DbError::not_found("tenant", slug))
    }

    pub async fn list(&mut self, page: Pagination) -> Result<Paginated<Tenant>, DbError> {
        let query = ListQuery {
            columns: "t.id, t.name, t.description, t.url, t.is_active, t.slug, t.created_at, t.updated_at",
            from: "tenant t",
            alias: "t",
            order_by: "t.created_at DESC, t.id",
        };
        fetch_page(&mut *self.conn, query, Scope::Global, |_| {}, page).await
    }

    /// Apply a validated update. `slug` is the already-resolved slug when
    /// it changes.
    pub async fn update(
        &mut self,
        id: TenantId,
        changes: &TenantUpdate,
        slug: Option<&str>,
    ) -> Result<Tenant, DbError> {
        sqlx::query_as::<_, Tenant>(&format!(
            "UPDATE tenant SET \
                name = COALESCE($2, name), \
                description = COALESCE($3, description), \
                url = COALESCE($4, url), \
                is_active = COALESCE($5, is_active), \
                slug = COALESCE($6, slug), \
                updated_at = now() \
             WHERE id = $1 RETURNING {COLUMNS}"
        ))
        .bind(id.as_uuid())
        .bind(&changes.name)
        .bind(&changes.description)
        .bind(&changes.url)
        .bind(changes.is_active)
        .bind(slug)
        .fetch_optional(&mut *self.conn)
        .await?
        .ok_or_else(|| DbError::not_found("tenant", id))
    }

    pub async fn delete(&mut self, id: TenantId) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM tenant WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *self.conn)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::not_found("tenant", id));
        }
        Ok(())
    }
}
