//! Bearer sessions, stored by token digest

use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use uuid::Uuid;

use crate::db::DbError;
use crate::models::User;

pub struct SessionRepo<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> SessionRepo<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    pub async fn insert(
        &mut self,
        user_id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), DbError> {
        sqlx::query("INSERT INTO user_session (user_id, token_hash, expires_at) VALUES ($1, $2, $3)")
            .bind(user_id)
            .bind(token_hash)
            .bind(expires_at)
            .execute(&mut *self.conn)
            .await?;
        Ok(())
    }

    /// Active user owning an unexpired session.
    pub async fn resolve(&mut self, token_hash: &str) -> Result<Option<User>, DbError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT u.id, u.email, u.name, u.is_active, u.is_superuser, u.is_verified, \
                    u.tenant_id, u.created_at, u.updated_at \
             FROM user_session s JOIN user_account u ON u.id = s.user_id \
             WHERE s.token_hash = $1 AND s.expires_at > now() AND u.is_active",
        )
        .bind(token_hash)
        .fetch_optional(&mut *self.conn)
        .await?;
        Ok(user)
    }

    pub async fn delete(&mut self, token_hash: &str) -> Result<(), DbError> {
        sqlx::query("DELETE FROM user_session WHERE token_hash = $1")
            .bind(token_hash)
            .execute(&mut *self.conn)
            .await?;
        Ok(())
    }

    /// Remove expired sessions; returns how many were removed.
    pub async fn purge_expired(&mut self) -> Result<u64, DbError> {
        let result = sqlx::query("DELETE FROM user_session WHERE expires_at <= now()")
            .execute(&mut *self.conn)
            .await?;
        Ok(result.rows_affected())
    }
}
