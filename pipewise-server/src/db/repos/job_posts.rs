use chrono::{DateTime, Utc};
use pipewise_core::codec::{decode, decode_list, encode, encode_list};
use pipewise_core::Scope;
use serde_json::Value;
use sqlx::{FromRow, PgConnection};
use uuid::Uuid;

use crate::db::scope::{fetch_page, ListQuery};
use crate::db::DbError;
use crate::models::{JobPost, JobPostCreate, Paginated, Pagination};

const COLUMNS: &str = "id, title, body, url, location, tools, company_id, created_at, updated_at";

#[derive(FromRow)]
struct JobPostRow {
    id: Uuid,
    title: String,
    body: Option<String>,
    url: Option<String>,
    location: Option<Value>,
    tools: Option<Value>,
    company_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<JobPostRow> for JobPost {
    type Error = DbError;

    fn try_from(row: JobPostRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            title: row.title,
            body: row.body,
            url: row.url,
            location: decode(row.location)?,
            tools: decode_list(row.tools)?,
            company_id: row.company_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub struct JobPostRepo<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> JobPostRepo<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    pub async fn insert(&mut self, input: &JobPostCreate) -> Result<JobPost, DbError> {
        sqlx::query_as::<_, JobPostRow>(&format!(
            "INSERT INTO job_post (title, body, url, location, tools, company_id) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {COLUMNS}"
        ))
        .bind(&input.title)
        .bind(&input.body)
        .bind(&input.url)
        .bind(encode(input.location.as_ref())?)
        .bind(encode_list(&input.tools)?)
        .bind(input.company_id)
        .fetch_one(&mut *self.conn)
        .await?
        .try_into()
    }

    pub async fn get(&mut self, id: Uuid) -> Result<JobPost, DbError> {
        sqlx::query_as::<_, JobPostRow>(&format!("SELECT {COLUMNS} FROM job_post WHERE id = $1"))
            .bind(id)
            .fetch_optional(&mut *self.conn)
            .await?
            .ok_or_else(|| DbError::not_found("job post", id))?
            .try_into()
    }

    pub async fn list(
        &mut self,
        company_id: Option<Uuid>,
        page: Pagination,
    ) -> Result<Paginated<JobPost>, DbError> {
        let query = ListQuery {
            columns: "j.id, j.title, j.body, j.url, j.location, j.tools, j.company_id, \
                      j.created_at, j.updated_at",
            from: "job_post j",
            alias: "j",
            order_by: "j.created_at DESC, j.id",
        };
        let rows: Paginated<JobPostRow> = fetch_page(
            &mut *self.conn,
            query,
            Scope::Global,
            |q| {
                if let Some(company) = company_id {
                    q.and_eq("j.company_id", company);
                }
            },
            page,
        )
        .await?;
        rows.try_map(JobPost::try_from)
    }

    pub async fn existing(&mut self, ids: &[Uuid]) -> Result<Vec<Uuid>, DbError> {
        let found = sqlx::query_scalar("SELECT id FROM job_post WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&mut *self.conn)
            .await?;
        Ok(found)
    }
}
