use std::borrow::Cow;

use async_trait::async_trait;
use pipewise_core::Scope;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::{insert_with_unique_slug, ServiceResult, SlugInsert};
use crate::db::repos::{CompanyRepo, PersonRepo};
use crate::db::slugs::SlugTable;
use crate::db::DbError;
use crate::models::{Paginated, Pagination, Person, PersonCreate};

#[async_trait]
impl SlugInsert for PersonCreate {
    type Output = Person;

    const TABLE: SlugTable = SlugTable::Person;

    fn slug_source(&self) -> Cow<'_, str> {
        Cow::Owned(self.display_name().unwrap_or_else(|| "untitled".to_string()))
    }

    fn requested_slug(&self) -> Option<&str> {
        self.slug.as_deref()
    }

    async fn insert(&self, conn: &mut PgConnection, slug: &str) -> Result<Person, DbError> {
        PersonRepo::new(conn).insert(self, slug).await
    }
}

pub struct PersonService<'a> {
    pool: &'a PgPool,
}

impl<'a> PersonService<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, input: PersonCreate) -> ServiceResult<Person> {
        let input = input.validated()?;
        let mut tx = self.pool.begin().await?;
        if let Some(company_id) = input.company_id {
            CompanyRepo::new(&mut tx).get(company_id).await?;
        }
        let person = insert_with_unique_slug(&mut tx, Scope::Global, &input).await?;
        tx.commit().await?;
        tracing::info!(person_id = %person.id, slug = %person.slug, "created person");
        Ok(person)
    }

    pub async fn get(&self, id: Uuid) -> ServiceResult<Person> {
        let mut tx = self.pool.begin().await?;
        let person = PersonRepo::new(&mut tx).get(id).await?;
        tx.commit().await?;
        Ok(person)
    }

    pub async fn list(
        &self,
        company_id: Option<Uuid>,
        search: Option<&str>,
        page: Pagination,
    ) -> ServiceResult<Paginated<Person>> {
        let mut tx = self.pool.begin().await?;
        let people = PersonRepo::new(&mut tx).list(company_id, search, page).await?;
        tx.commit().await?;
        Ok(people)
    }
}
