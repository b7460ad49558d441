use chrono::{DateTime, Utc};
use pipewise_core::codec::{decode, decode_list, encode, encode_list};
use pipewise_core::{CodecError, Scope};
use serde_json::Value;
use sqlx::{FromRow, PgConnection};
use uuid::Uuid;

use crate::db::scope::{fetch_page, ListQuery};
use crate::db::DbError;
use crate::models::{Paginated, Pagination, Person, PersonCreate};

const COLUMNS: &str = "id, slug, first_name, last_name, full_name, headline, title, summary, url, \
     linkedin_profile_url, work_email, location, work_experiences, social_activities, skills, \
     company_id, created_at, updated_at";

#[derive(FromRow)]
struct PersonRow {
    id: Uuid,
    slug: String,
    first_name: Option<String>,
    last_name: Option<String>,
    full_name: Option<String>,
    headline: Option<String>,
    title: Option<String>,
    summary: Option<String>,
    url: Option<String>,
    linkedin_profile_url: Option<String>,
    work_email: Option<String>,
    location: Option<Value>,
    work_experiences: Option<Value>,
    social_activities: Option<Value>,
    skills: Option<Value>,
    company_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Skills are a plain list of strings rather than value objects.
fn decode_skills(stored: Option<Value>) -> Result<Vec<String>, CodecError> {
    match stored {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(value) => serde_json::from_value(value)
            .map_err(|e| CodecError::unexpected_shape("skills", e.to_string())),
    }
}

impl TryFrom<PersonRow> for Person {
    type Error = DbError;

    fn try_from(row: PersonRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            slug: row.slug,
            first_name: row.first_name,
            last_name: row.last_name,
            full_name: row.full_name,
            headline: row.headline,
            title: row.title,
            summary: row.summary,
            url: row.url,
            linkedin_profile_url: row.linkedin_profile_url,
            work_email: row.work_email,
            location: decode(row.location)?,
            work_experiences: decode_list(row.work_experiences)?,
            social_activities: decode_list(row.social_activities)?,
            skills: decode_skills(row.skills)?,
            company_id: row.company_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub struct PersonRepo<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> PersonRepo<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    pub async fn insert(&mut self, input: &PersonCreate, slug: &str) -> Result<Person, DbError> {
        let row = sqlx::query_as::<_, PersonRow>(&format!(
            "INSERT INTO person (slug, first_name, last_name, full_name, headline, title, summary, \
                url, linkedin_profile_url, work_email, location, work_experiences, \
                social_activities, skills, company_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15) \
             RETURNING {COLUMNS}"
        ))
        .bind(slug)
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(&input.full_name)
        .bind(&input.headline)
        .bind(&input.title)
        .bind(&input.summary)
        .bind(&input.url)
        .bind(&input.linkedin_profile_url)
        .bind(&input.work_email)
        .bind(encode(input.location.as_ref())?)
        .bind(encode_list(&input.work_experiences)?)
        .bind(encode_list(&input.social_activities)?)
        .bind(sqlx::types::Json(&input.skills))
        .bind(input.company_id)
        .fetch_one(&mut *self.conn)
        .await?;
        row.try_into()
    }

    pub async fn get(&mut self, id: Uuid) -> Result<Person, DbError> {
        sqlx::query_as::<_, PersonRow>(&format!("SELECT {COLUMNS} FROM person WHERE id = $1"))
            .bind(id)
            .fetch_optional(&mut *self.conn)
            .await?
            .ok_or_else(|| DbError::not_found("person", id))?
            .try_into()
    }

    pub async fn list(
        &mut self,
        company_id: Option<Uuid>,
        search: Option<&str>,
        page: Pagination,
    ) -> Result<Paginated<Person>, DbError> {
        let query = ListQuery {
            columns: "p.id, p.slug, p.first_name, p.last_name, p.full_name, p.headline, p.title, \
                      p.summary, p.url, p.linkedin_profile_url, p.work_email, p.location, \
                      p.work_experiences, p.social_activities, p.skills, p.company_id, \
                      p.created_at, p.updated_at",
            from: "person p",
            alias: "p",
            order_by: "p.full_name NULLS LAST, p.id",
        };
        let rows: Paginated<PersonRow> = fetch_page(
            &mut *self.conn,
            query,
            Scope::Global,
            |q| {
                if let Some(company) = company_id {
                    q.and_eq("p.company_id", company);
                }
                if let Some(term) = search {
                    q.and_contains("p.full_name", term);
                }
            },
            page,
        )
        .await?;
        rows.try_map(Person::try_from)
    }

    /// Ids among `ids` that exist.
    pub async fn existing(&mut self, ids: &[Uuid]) -> Result<Vec<Uuid>, DbError> {
        let found = sqlx::query_scalar("SELECT id FROM person WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&mut *self.conn)
            .await?;
        Ok(found)
    }
}
