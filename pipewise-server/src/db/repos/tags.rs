use pipewise_core::Scope;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::db::scope::{fetch_page, ListQuery};
use crate::db::DbError;
use crate::models::{Paginated, Pagination, Tag, TagCreate};

pub struct TagRepo<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> TagRepo<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    pub async fn insert(&mut self, input: &TagCreate, slug: &str) -> Result<Tag, DbError> {
        let tag = sqlx::query_as::<_, Tag>(
            "INSERT INTO tag (slug, name, description) VALUES ($1, $2, $3) \
             RETURNING id, slug, name, description, created_at",
        )
        .bind(slug)
        .bind(&input.name)
        .bind(&input.description)
        .fetch_one(&mut *self.conn)
        .await?;
        Ok(tag)
    }

    pub async fn get(&mut self, id: Uuid) -> Result<Tag, DbError> {
        sqlx::query_as::<_, Tag>(
            "SELECT id, slug, name, description, created_at FROM tag WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.conn)
        .await?
        .ok_or_else(|| DbError::not_found("tag", id))
    }

    pub async fn list(&mut self, page: Pagination) -> Result<Paginated<Tag>, DbError> {
        let query = ListQuery {
            columns: "t.id, t.slug, t.name, t.description, t.created_at",
            from: "tag t",
            alias: "t",
            order_by: "t.name, t.id",
        };
        fetch_page(&mut *self.conn, query, Scope::Global, |_| {}, page).await
    }
}
