//! User repository
//!
//! Users belong to one tenant. Every lookup but the login-by-email path
//! is scoped by tenant.

use pipewise_core::TenantId;
use sqlx::{FromRow, PgConnection};
use uuid::Uuid;

use crate::db::scope::{fetch_page, ListQuery};
use crate::db::DbError;
use crate::models::{Paginated, Pagination, User};

const COLUMNS: &str =
    "id, email, name, is_active, is_superuser, is_verified, tenant_id, created_at, updated_at";

/// A user plus the stored password hash, for login only.
#[derive(Debug, Clone, FromRow)]
pub struct UserCredentials {
    #[sqlx(flatten)]
    pub user: User,
    pub hashed_password: Option<String>,
}

pub struct UserRepo<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> UserRepo<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    pub async fn insert(
        &mut self,
        tenant: TenantId,
        email: &str,
        name: Option<&str>,
        hashed_password: &str,
        is_superuser: bool,
    ) -> Result<User, DbError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO user_account (email, name, hashed_password, is_superuser, tenant_id) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {COLUMNS}"
        ))
        .bind(email)
        .bind(name)
        .bind(hashed_password)
        .bind(is_superuser)
        .bind(tenant.as_uuid())
        .fetch_one(&mut *self.conn)
        .await?;
        Ok(user)
    }

    pub async fn get(&mut self, tenant: TenantId, id: Uuid) -> Result<User, DbError> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {COLUMNS} FROM user_account WHERE id = $1 AND tenant_id = $2"
        ))
        .bind(id)
        .bind(tenant.as_uuid())
        .fetch_optional(&mut *self.conn)
        .await?
        .ok_or_else(|| DbError::not_found("user", id))
    }

    pub async fn get_by_email(&mut self, tenant: TenantId, email: &str) -> Result<User, DbError> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {COLUMNS} FROM user_account WHERE email = $1 AND tenant_id = $2"
        ))
        .bind(email)
        .bind(tenant.as_uuid())
        .fetch_optional(&mut *self.conn)
        .await?
        .ok_or_else(|| DbError::not_found("user", email))
    }

    /// Login lookup. Emails are globally unique, so this is the one query
    /// that runs before the tenant is known.
    pub async fn credentials(&mut self, email: &str) -> Result<Option<UserCredentials>, DbError> {
        let row = sqlx::query_as::<_, UserCredentials>(&format!(
            "SELECT {COLUMNS}, hashed_password FROM user_account WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&mut *self.conn)
        .await?;
        Ok(row)
    }

    pub async fn list(
        &mut self,
        tenant: TenantId,
        page: Pagination,
    ) -> Result<Paginated<User>, DbError> {
        let query = ListQuery {
            columns: "u.id, u.email, u.name, u.is_active, u.is_superuser, u.is_verified, \
                      u.tenant_id, u.created_at, u.updated_at",
            from: "user_account u",
            alias: "u",
            order_by: "u.created_at DESC, u.id",
        };
        fetch_page(&mut *self.conn, query, tenant.into(), |_| {}, page).await
    }

    pub async fn update(
        &mut self,
        tenant: TenantId,
        id: Uuid,
        name: Option<&str>,
        hashed_password: Option<&str>,
        is_active: Option<bool>,
        is_superuser: Option<bool>,
    ) -> Result<User, DbError> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE user_account SET \
                name = COALESCE($3, name), \
                hashed_password = COALESCE($4, hashed_password), \
                is_active = COALESCE($5, is_active), \
                is_superuser = COALESCE($6, is_superuser), \
                updated_at = now() \
             WHERE id = $1 AND tenant_id = $2 RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(tenant.as_uuid())
        .bind(name)
        .bind(hashed_password)
        .bind(is_active)
        .bind(is_superuser)
        .fetch_optional(&mut *self.conn)
        .await?
        .ok_or_else(|| DbError::not_found("user", id))
    }

    pub async fn delete(&mut self, tenant: TenantId, id: Uuid) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM user_account WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant.as_uuid())
            .execute(&mut *self.conn)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::not_found("user", id));
        }
        Ok(())
    }
}
