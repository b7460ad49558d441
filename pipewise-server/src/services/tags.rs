use std::borrow::Cow;

use async_trait::async_trait;
use pipewise_core::Scope;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::{insert_with_unique_slug, ServiceResult, SlugInsert};
use crate::db::repos::TagRepo;
use crate::db::slugs::SlugTable;
use crate::db::DbError;
use crate::models::{Paginated, Pagination, Tag, TagCreate};

#[async_trait]
impl SlugInsert for TagCreate {
    type Output = Tag;

    const TABLE: SlugTable = SlugTable::Tag;

    fn slug_source(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.name)
    }

    fn requested_slug(&self) -> Option<&str> {
        self.slug.as_deref()
    }

    async fn insert(&self, conn: &mut PgConnection, slug: &str) -> Result<Tag, DbError> {
        TagRepo::new(conn).insert(self, slug).await
    }
}

pub struct TagService<'a> {
    pool: &'a PgPool,
}

impl<'a> TagService<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, input: TagCreate) -> ServiceResult<Tag> {
        let input = input.validated()?;
        let mut tx = self.pool.begin().await?;
        let tag = insert_with_unique_slug(&mut tx, Scope::Global, &input).await?;
        tx.commit().await?;
        Ok(tag)
    }

    pub async fn get(&self, id: Uuid) -> ServiceResult<Tag> {
        let mut tx = self.pool.begin().await?;
        let tag = TagRepo::new(&mut tx).get(id).await?;
        tx.commit().await?;
        Ok(tag)
    }

    pub async fn list(&self, page: Pagination) -> ServiceResult<Paginated<Tag>> {
        let mut tx = self.pool.begin().await?;
        let tags = TagRepo::new(&mut tx).list(page).await?;
        tx.commit().await?;
        Ok(tags)
    }
}
