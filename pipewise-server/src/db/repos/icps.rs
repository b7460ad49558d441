//! ICP repository
//!
//! Each criteria block is its own JSON column; an absent block is NULL.

use chrono::{DateTime, Utc};
use pipewise_core::codec::{decode, encode};
use pipewise_core::TenantId;
use serde_json::Value;
use sqlx::{FromRow, PgConnection};
use uuid::Uuid;

use crate::db::DbError;
use crate::models::{Icp, IcpCreate};

const COLUMNS: &str =
    "id, name, company, tool, process, person, pitch, tenant_id, created_at, updated_at";

#[derive(FromRow)]
struct IcpRow {
    id: Uuid,
    name: String,
    company: Option<Value>,
    tool: Option<Value>,
    process: Option<Value>,
    person: Option<Value>,
    pitch: Option<String>,
    tenant_id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<IcpRow> for Icp {
    type Error = DbError;

    fn try_from(row: IcpRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            name: row.name,
            company: decode(row.company)?,
            tool: decode(row.tool)?,
            process: decode(row.process)?,
            person: decode(row.person)?,
            pitch: row.pitch,
            tenant_id: row.tenant_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub struct IcpRepo<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> IcpRepo<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    /// The tenant's ICP: the oldest one, when several exist.
    pub async fn first(&mut self, tenant: TenantId) -> Result<Option<Icp>, DbError> {
        sqlx::query_as::<_, IcpRow>(&format!(
            "SELECT {COLUMNS} FROM icp WHERE tenant_id = $1 ORDER BY created_at, id LIMIT 1"
        ))
        .bind(tenant.as_uuid())
        .fetch_optional(&mut *self.conn)
        .await?
        .map(Icp::try_from)
        .transpose()
    }

    pub async fn insert(&mut self, tenant: TenantId, input: &IcpCreate) -> Result<Icp, DbError> {
        sqlx::query_as::<_, IcpRow>(&format!(
            "INSERT INTO icp (name, company, tool, process, person, pitch, tenant_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {COLUMNS}"
        ))
        .bind(&input.name)
        .bind(encode(input.company.as_ref())?)
        .bind(encode(input.tool.as_ref())?)
        .bind(encode(input.process.as_ref())?)
        .bind(encode(input.person.as_ref())?)
        .bind(&input.pitch)
        .bind(tenant.as_uuid())
        .fetch_one(&mut *self.conn)
        .await?
        .try_into()
    }

    pub async fn save(&mut self, icp: &Icp) -> Result<Icp, DbError> {
        sqlx::query_as::<_, IcpRow>(&format!(
            "UPDATE icp SET name = $3, company = $4, tool = $5, process = $6, person = $7, \
                pitch = $8, updated_at = now() \
             WHERE id = $1 AND tenant_id = $2 RETURNING {COLUMNS}"
        ))
        .bind(icp.id)
        .bind(icp.tenant_id)
        .bind(&icp.name)
        .bind(encode(icp.company.as_ref())?)
        .bind(encode(icp.tool.as_ref())?)
        .bind(encode(icp.process.as_ref())?)
        .bind(encode(icp.person.as_ref())?)
        .bind(&icp.pitch)
        .fetch_optional(&mut *self.conn)
        .await?
        .ok_or_else(|| DbError::not_found("icp", icp.id))?
        .try_into()
    }
}
