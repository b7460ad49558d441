//! Role repository and user-role links

use sqlx::PgConnection;
use uuid::Uuid;

use crate::db::DbError;
use crate::models::Role;

pub const APPLICATION_ACCESS: &str = "application-access";
pub const SUPERUSER: &str = "superuser";

pub struct RoleRepo<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> RoleRepo<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    pub async fn get_by_slug(&mut self, slug: &str) -> Result<Role, DbError> {
        sqlx::query_as::<_, Role>("SELECT id, slug, name, description FROM role WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&mut *self.conn)
            .await?
            .ok_or_else(|| DbError::not_found("role", slug))
    }

    pub async fn list(&mut self) -> Result<Vec<Role>, DbError> {
        let roles = sqlx::query_as::<_, Role>(
            "SELECT id, slug, name, description FROM role ORDER BY slug",
        )
        .fetch_all(&mut *self.conn)
        .await?;
        Ok(roles)
    }

    /// Link a role to a user. Assigning twice is a no-op.
    pub async fn assign(&mut self, user_id: Uuid, role_id: Uuid) -> Result<(), DbError> {
        sqlx::query(
            "INSERT INTO user_account_role (user_id, role_id) VALUES ($1, $2) \
             ON CONFLICT (user_id, role_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(role_id)
        .execute(&mut *self.conn)
        .await?;
        Ok(())
    }

    /// Returns whether a link was removed.
    pub async fn revoke(&mut self, user_id: Uuid, role_id: Uuid) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM user_account_role WHERE user_id = $1 AND role_id = $2")
            .bind(user_id)
            .bind(role_id)
            .execute(&mut *self.conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn slugs_for(&mut self, user_id: Uuid) -> Result<Vec<String>, DbError> {
        let slugs = sqlx::query_scalar(
            "SELECT r.slug FROM role r \
             JOIN user_account_role ur ON ur.role_id = r.id \
             WHERE ur.user_id = $1 ORDER BY r.slug",
        )
        .bind(user_id)
        .fetch_all(&mut *self.conn)
        .await?;
        Ok(slugs)
    }
}
