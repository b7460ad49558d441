//! Opportunity repository
//!
//! Opportunities are tenant-owned: every statement here carries the
//! tenant predicate, and a row of another tenant is indistinguishable
//! from a missing one.

use chrono::{DateTime, Utc};
use pipewise_core::{CodecError, EnumColumn, OpportunityStage, TenantId};
use serde::de::DeserializeOwned;
use serde_json::Value;
use sqlx::{FromRow, PgConnection};
use uuid::Uuid;

use crate::db::scope::{fetch_page, ListQuery};
use crate::db::DbError;
use crate::models::{
    AuditLogEntry, ContactSummary, JobPostSummary, Opportunity, OpportunityCreate,
    OpportunityDetail, OpportunityFilter, Paginated, Pagination,
};

const COLUMNS: &str =
    "id, slug, name, stage, notes, owner_id, company_id, tenant_id, created_at, updated_at";

/// Detail row: the opportunity plus its links, aggregated in one round trip.
const DETAIL_QUERY: &str = r#"
    SELECT
        o.id, o.slug, o.name, o.stage, o.notes, o.owner_id, o.company_id, o.tenant_id,
        o.created_at, o.updated_at,
        COALESCE((
            SELECT json_agg(json_build_object(
                'id', p.id, 'slug', p.slug, 'full_name', p.full_name, 'title', p.title,
                'linkedin_profile_url', p.linkedin_profile_url, 'location', p.location
            ) ORDER BY p.full_name, p.id)
            FROM opportunity_person op JOIN person p ON p.id = op.person_id
            WHERE op.opportunity_id = o.id
        ), '[]'::json) AS contacts,
        COALESCE((
            SELECT json_agg(json_build_object(
                'id', j.id, 'title', j.title, 'url', j.url, 'body', j.body,
                'location', j.location, 'tools', j.tools, 'company_id', j.company_id
            ) ORDER BY j.created_at, j.id)
            FROM opportunity_job_post oj JOIN job_post j ON j.id = oj.job_post_id
            WHERE oj.opportunity_id = o.id
        ), '[]'::json) AS job_posts,
        COALESCE((
            SELECT json_agg(json_build_object(
                'id', l.id, 'operation', l.operation, 'diff', l.diff,
                'user_id', l.user_id, 'created_at', l.created_at
            ) ORDER BY l.created_at DESC, l.id)
            FROM opportunity_audit_log l
            WHERE l.opportunity_id = o.id AND l.tenant_id = o.tenant_id
        ), '[]'::json) AS logs
    FROM opportunity o
    WHERE o.tenant_id = $1 AND o.id = $2
"#;

#[derive(FromRow)]
struct OpportunityRow {
    id: Uuid,
    slug: String,
    name: String,
    stage: String,
    notes: Option<String>,
    owner_id: Option<Uuid>,
    company_id: Option<Uuid>,
    tenant_id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OpportunityRow> for Opportunity {
    type Error = DbError;

    fn try_from(row: OpportunityRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            slug: row.slug,
            name: row.name,
            stage: OpportunityStage::from_tag(&row.stage)?,
            notes: row.notes,
            owner_id: row.owner_id,
            company_id: row.company_id,
            tenant_id: row.tenant_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct DetailRow {
    #[sqlx(flatten)]
    opportunity: OpportunityRow,
    contacts: Value,
    job_posts: Value,
    logs: Value,
}

fn decode_aggregate<T: DeserializeOwned>(column: &'static str, value: Value) -> Result<Vec<T>, DbError> {
    serde_json::from_value(value)
        .map_err(|e| DbError::Decode(CodecError::unexpected_shape(column, e.to_string())))
}

pub struct OpportunityRepo<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> OpportunityRepo<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    pub async fn insert(
        &mut self,
        tenant: TenantId,
        input: &OpportunityCreate,
        slug: &str,
    ) -> Result<Opportunity, DbError> {
        sqlx::query_as::<_, OpportunityRow>(&format!(
            "INSERT INTO opportunity (slug, name, stage, notes, owner_id, company_id, tenant_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {COLUMNS}"
        ))
        .bind(slug)
        .bind(&input.name)
        .bind(input.stage.as_tag())
        .bind(&input.notes)
        .bind(input.owner_id)
        .bind(input.company_id)
        .bind(tenant.as_uuid())
        .fetch_one(&mut *self.conn)
        .await?
        .try_into()
    }

    pub async fn get_one(&mut self, tenant: TenantId, id: Uuid) -> Result<Opportunity, DbError> {
        sqlx::query_as::<_, OpportunityRow>(&format!(
            "SELECT {COLUMNS} FROM opportunity WHERE id = $1 AND tenant_id = $2"
        ))
        .bind(id)
        .bind(tenant.as_uuid())
        .fetch_optional(&mut *self.conn)
        .await?
        .ok_or_else(|| DbError::not_found("opportunity", id))?
        .try_into()
    }

    /// Opportunity with contacts, job posts and audit log. The ICP match
    /// is left for the service to fill in.
    pub async fn detail(&mut self, tenant: TenantId, id: Uuid) -> Result<OpportunityDetail, DbError> {
        let row = sqlx::query_as::<_, DetailRow>(DETAIL_QUERY)
            .bind(tenant.as_uuid())
            .bind(id)
            .fetch_optional(&mut *self.conn)
            .await?
            .ok_or_else(|| DbError::not_found("opportunity", id))?;

        Ok(OpportunityDetail {
            opportunity: row.opportunity.try_into()?,
            contacts: decode_aggregate::<ContactSummary>("contacts", row.contacts)?,
            job_posts: decode_aggregate::<JobPostSummary>("job_posts", row.job_posts)?,
            logs: decode_aggregate::<AuditLogEntry>("logs", row.logs)?,
            icp_match: None,
        })
    }

    pub async fn list(
        &mut self,
        tenant: TenantId,
        filter: &OpportunityFilter,
        page: Pagination,
    ) -> Result<Paginated<Opportunity>, DbError> {
        let query = ListQuery {
            columns: "o.id, o.slug, o.name, o.stage, o.notes, o.owner_id, o.company_id, \
                      o.tenant_id, o.created_at, o.updated_at",
            from: "opportunity o",
            alias: "o",
            order_by: "o.created_at DESC, o.id",
        };
        let rows: Paginated<OpportunityRow> = fetch_page(
            &mut *self.conn,
            query,
            tenant.into(),
            |q| {
                if let Some(stage) = filter.stage {
                    q.and_eq("o.stage", stage.as_tag());
                }
                if let Some(company) = filter.company_id {
                    q.and_eq("o.company_id", company);
                }
                if let Some(owner) = filter.owner_id {
                    q.and_eq("o.owner_id", owner);
                }
                if let Some(term) = filter.search.as_deref() {
                    q.and_contains("o.name", term);
                }
            },
            page,
        )
        .await?;
        rows.try_map(Opportunity::try_from)
    }

    /// Write every mutable column of `opportunity`, within its tenant.
    pub async fn save(&mut self, opportunity: &Opportunity) -> Result<Opportunity, DbError> {
        sqlx::query_as::<_, OpportunityRow>(&format!(
            "UPDATE opportunity SET slug = $3, name = $4, stage = $5, notes = $6, owner_id = $7, \
                company_id = $8, updated_at = now() \
             WHERE id = $1 AND tenant_id = $2 RETURNING {COLUMNS}"
        ))
        .bind(opportunity.id)
        .bind(opportunity.tenant_id)
        .bind(&opportunity.slug)
        .bind(&opportunity.name)
        .bind(opportunity.stage.as_tag())
        .bind(&opportunity.notes)
        .bind(opportunity.owner_id)
        .bind(opportunity.company_id)
        .fetch_optional(&mut *self.conn)
        .await?
        .ok_or_else(|| DbError::not_found("opportunity", opportunity.id))?
        .try_into()
    }

    /// Replace the linked contacts. The ids must exist.
    pub async fn set_contacts(&mut self, opportunity_id: Uuid, person_ids: &[Uuid]) -> Result<(), DbError> {
        sqlx::query("DELETE FROM opportunity_person WHERE opportunity_id = $1")
            .bind(opportunity_id)
            .execute(&mut *self.conn)
            .await?;
        sqlx::query(
            "INSERT INTO opportunity_person (opportunity_id, person_id) \
             SELECT $1, person_id FROM UNNEST($2::uuid[]) AS person_id \
             ON CONFLICT DO NOTHING",
        )
        .bind(opportunity_id)
        .bind(person_ids)
        .execute(&mut *self.conn)
        .await?;
        Ok(())
    }

    /// Replace the linked job posts. The ids must exist.
    pub async fn set_job_posts(&mut self, opportunity_id: Uuid, job_post_ids: &[Uuid]) -> Result<(), DbError> {
        sqlx::query("DELETE FROM opportunity_job_post WHERE opportunity_id = $1")
            .bind(opportunity_id)
            .execute(&mut *self.conn)
            .await?;
        sqlx::query(
            "INSERT INTO opportunity_job_post (opportunity_id, job_post_id) \
             SELECT $1, job_post_id FROM UNNEST($2::uuid[]) AS job_post_id \
             ON CONFLICT DO NOTHING",
        )
        .bind(opportunity_id)
        .bind(job_post_ids)
        .execute(&mut *self.conn)
        .await?;
        Ok(())
    }
}
