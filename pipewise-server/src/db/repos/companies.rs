//! Company repository
//!
//! Companies are global reference data. `hq_location` and
//! `last_funding` are JSON columns decoded through the column codec.

use chrono::{DateTime, Utc};
use pipewise_core::codec::{decode, encode};
use pipewise_core::Scope;
use serde_json::Value;
use sqlx::{FromRow, PgConnection};
use uuid::Uuid;

use crate::db::scope::{fetch_page, ListQuery};
use crate::db::DbError;
use crate::models::{Company, CompanyCreate, Paginated, Pagination};

const COLUMNS: &str = "id, slug, name, description, type AS company_type, industry, headcount, \
     founded_year, url, profile_pic_url, linkedin_profile_url, hq_location, last_funding, \
     created_at, updated_at";

#[derive(FromRow)]
struct CompanyRow {
    id: Uuid,
    slug: String,
    name: String,
    description: Option<String>,
    company_type: Option<String>,
    industry: Option<String>,
    headcount: Option<i64>,
    founded_year: Option<i32>,
    url: Option<String>,
    profile_pic_url: Option<String>,
    linkedin_profile_url: Option<String>,
    hq_location: Option<Value>,
    last_funding: Option<Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CompanyRow> for Company {
    type Error = DbError;

    fn try_from(row: CompanyRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            slug: row.slug,
            name: row.name,
            description: row.description,
            company_type: row.company_type,
            industry: row.industry,
            headcount: row.headcount,
            founded_year: row.founded_year,
            url: row.url,
            profile_pic_url: row.profile_pic_url,
            linkedin_profile_url: row.linkedin_profile_url,
            hq_location: decode(row.hq_location)?,
            last_funding: decode(row.last_funding)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub struct CompanyRepo<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> CompanyRepo<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    pub async fn insert(&mut self, input: &CompanyCreate, slug: &str) -> Result<Company, DbError> {
        let row = sqlx::query_as::<_, CompanyRow>(&format!(
            "INSERT INTO company (slug, name, description, type, industry, headcount, founded_year, \
                url, profile_pic_url, linkedin_profile_url, hq_location, last_funding) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) RETURNING {COLUMNS}"
        ))
        .bind(slug)
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.company_type)
        .bind(&input.industry)
        .bind(input.headcount)
        .bind(input.founded_year)
        .bind(&input.url)
        .bind(&input.profile_pic_url)
        .bind(&input.linkedin_profile_url)
        .bind(encode(input.hq_location.as_ref())?)
        .bind(encode(input.last_funding.as_ref())?)
        .fetch_one(&mut *self.conn)
        .await?;
        row.try_into()
    }

    pub async fn get(&mut self, id: Uuid) -> Result<Company, DbError> {
        sqlx::query_as::<_, CompanyRow>(&format!("SELECT {COLUMNS} FROM company WHERE id = $1"))
            .bind(id)
            .fetch_optional(&mut *self.conn)
            .await?
            .ok_or_else(|| DbError::not_found("company", id))?
            .try_into()
    }

    pub async fn find_by_slug(&mut self, slug: &str) -> Result<Option<Company>, DbError> {
        sqlx::query_as::<_, CompanyRow>(&format!("SELECT {COLUMNS} FROM company WHERE slug = $1"))
            .bind(slug)
            .fetch_optional(&mut *self.conn)
            .await?
            .map(Company::try_from)
            .transpose()
    }

    pub async fn list(
        &mut self,
        search: Option<&str>,
        page: Pagination,
    ) -> Result<Paginated<Company>, DbError> {
        let query = ListQuery {
            columns: "c.id, c.slug, c.name, c.description, c.type AS company_type, c.industry, \
                      c.headcount, c.founded_year, c.url, c.profile_pic_url, \
                      c.linkedin_profile_url, c.hq_location, c.last_funding, c.created_at, \
                      c.updated_at",
            from: "company c",
            alias: "c",
            order_by: "c.name, c.id",
        };
        let rows: Paginated<CompanyRow> = fetch_page(
            &mut *self.conn,
            query,
            Scope::Global,
            |q| {
                if let Some(term) = search {
                    q.and_contains("c.name", term);
                }
            },
            page,
        )
        .await?;
        rows.try_map(Company::try_from)
    }

    /// Write every mutable column of `company`.
    pub async fn save(&mut self, company: &Company) -> Result<Company, DbError> {
        sqlx::query_as::<_, CompanyRow>(&format!(
            "UPDATE company SET slug = $2, name = $3, description = $4, type = $5, industry = $6, \
                headcount = $7, founded_year = $8, url = $9, profile_pic_url = $10, \
                linkedin_profile_url = $11, hq_location = $12, last_funding = $13, \
                updated_at = now() \
             WHERE id = $1 RETURNING {COLUMNS}"
        ))
        .bind(company.id)
        .bind(&company.slug)
        .bind(&company.name)
        .bind(&company.description)
        .bind(&company.company_type)
        .bind(&company.industry)
        .bind(company.headcount)
        .bind(company.founded_year)
        .bind(&company.url)
        .bind(&company.profile_pic_url)
        .bind(&company.linkedin_profile_url)
        .bind(encode(company.hq_location.as_ref())?)
        .bind(encode(company.last_funding.as_ref())?)
        .fetch_optional(&mut *self.conn)
        .await?
        .ok_or_else(|| DbError::not_found("company", company.id))?
        .try_into()
    }
}
