use std::borrow::Cow;

use async_trait::async_trait;
use pipewise_core::{Scope, TenantId};
use sqlx::{PgConnection, PgPool};

use super::{insert_with_unique_slug, slug_for_update, ServiceResult, SlugInsert};
use crate::db::repos::TenantRepo;
use crate::db::slugs::SlugTable;
use crate::db::DbError;
use crate::models::{Paginated, Pagination, Tenant, TenantCreate, TenantUpdate};

#[async_trait]
impl SlugInsert for TenantCreate {
    type Output = Tenant;

    const TABLE: SlugTable = SlugTable::Tenant;

    fn slug_source(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.name)
    }

    fn requested_slug(&self) -> Option<&str> {
        self.slug.as_deref()
    }

    async fn insert(&self, conn: &mut PgConnection, slug: &str) -> Result<Tenant, DbError> {
        TenantRepo::new(conn).insert(self, slug).await
    }
}

/// Create a tenant on an open transaction.
pub(crate) async fn create_in(conn: &mut PgConnection, input: &TenantCreate) -> Result<Tenant, DbError> {
    let tenant = insert_with_unique_slug(conn, Scope::Global, input).await?;
    tracing::info!(tenant_id = %tenant.id, slug = %tenant.slug, "created tenant");
    Ok(tenant)
}

pub struct TenantService<'a> {
    pool: &'a PgPool,
}

impl<'a> TenantService<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, input: TenantCreate) -> ServiceResult<Tenant> {
        let input = input.validated()?;
        let mut tx = self.pool.begin().await?;
        let tenant = create_in(&mut tx, &input).await?;
        tx.commit().await?;
        Ok(tenant)
    }

    pub async fn get(&self, id: TenantId) -> ServiceResult<Tenant> {
        let mut tx = self.pool.begin().await?;
        let tenant = TenantRepo::new(&mut tx).get(id).await?;
        tx.commit().await?;
        Ok(tenant)
    }

    pub async fn get_by_slug(&self, slug: &str) -> ServiceResult<Tenant> {
        let mut tx = self.pool.begin().await?;
        let tenant = TenantRepo::new(&mut tx).get_by_slug(slug).await?;
        tx.commit().await?;
        Ok(tenant)
    }

    pub async fn list(&self, page: Pagination) -> ServiceResult<Paginated<Tenant>> {
        let mut tx = self.pool.begin().await?;
        let tenants = TenantRepo::new(&mut tx).list(page).await?;
        tx.commit().await?;
        Ok(tenants)
    }

    pub async fn update(&self, id: TenantId, changes: TenantUpdate) -> ServiceResult<Tenant> {
        let changes = changes.validated()?;
        let mut tx = self.pool.begin().await?;
        let current = TenantRepo::new(&mut tx).get(id).await?;
        let slug = slug_for_update(
            &mut tx,
            SlugTable::Tenant,
            Scope::Global,
            current.id,
            &current.name,
            changes.name.as_deref(),
            changes.slug.as_deref(),
        )
        .await?;
        let tenant = TenantRepo::new(&mut tx).update(id, &changes, slug.as_deref()).await?;
        tx.commit().await?;
        Ok(tenant)
    }

    pub async fn delete(&self, id: TenantId) -> ServiceResult<()> {
        let mut tx = self.pool.begin().await?;
        TenantRepo::new(&mut tx).delete(id).await?;
        tx.commit().await?;
        tracing::info!(tenant_id = %id, "deleted tenant");
        Ok(())
    }
}
