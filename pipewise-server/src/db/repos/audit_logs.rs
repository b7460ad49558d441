//! Append-only opportunity audit log

use pipewise_core::TenantId;
use serde_json::Value;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::db::DbError;
use crate::models::AuditLogEntry;

pub struct NewAuditLog<'a> {
    pub opportunity_id: Uuid,
    /// `None` for system-initiated changes.
    pub user_id: Option<Uuid>,
    pub operation: &'a str,
    pub diff: Value,
}

pub struct AuditLogRepo<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> AuditLogRepo<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    pub async fn append(&mut self, tenant: TenantId, entry: NewAuditLog<'_>) -> Result<AuditLogEntry, DbError> {
        let row = sqlx::query_as::<_, AuditLogEntry>(
            "INSERT INTO opportunity_audit_log (operation, diff, user_id, opportunity_id, tenant_id) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, operation, diff, user_id, created_at",
        )
        .bind(entry.operation)
        .bind(entry.diff)
        .bind(entry.user_id)
        .bind(entry.opportunity_id)
        .bind(tenant.as_uuid())
        .fetch_one(&mut *self.conn)
        .await?;
        Ok(row)
    }

    /// Entries for one opportunity, newest first.
    pub async fn for_opportunity(
        &mut self,
        tenant: TenantId,
        opportunity_id: Uuid,
    ) -> Result<Vec<AuditLogEntry>, DbError> {
        let rows = sqlx::query_as::<_, AuditLogEntry>(
            "SELECT id, operation, diff, user_id, created_at FROM opportunity_audit_log \
             WHERE tenant_id = $1 AND opportunity_id = $2 ORDER BY created_at DESC, id",
        )
        .bind(tenant.as_uuid())
        .bind(opportunity_id)
        .fetch_all(&mut *self.conn)
        .await?;
        Ok(rows)
    }
}
