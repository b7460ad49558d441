use pipewise_core::TenantId;
use sqlx::PgPool;

use super::ServiceResult;
use crate::db::repos::IcpRepo;
use crate::db::DbError;
use crate::models::{Icp, IcpCreate, IcpUpdate};

pub struct IcpService<'a> {
    pool: &'a PgPool,
}

impl<'a> IcpService<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The tenant's ICP.
    pub async fn get(&self, tenant: TenantId) -> ServiceResult<Icp> {
        let mut tx = self.pool.begin().await?;
        let icp = IcpRepo::new(&mut tx)
            .first(tenant)
            .await?
            .ok_or_else(|| DbError::not_found("icp", tenant))?;
        tx.commit().await?;
        Ok(icp)
    }

    pub async fn create(&self, tenant: TenantId, input: IcpCreate) -> ServiceResult<Icp> {
        let input = input.validated()?;
        let mut tx = self.pool.begin().await?;
        let icp = IcpRepo::new(&mut tx).insert(tenant, &input).await?;
        tx.commit().await?;
        tracing::info!(icp_id = %icp.id, tenant_id = %tenant, "created icp");
        Ok(icp)
    }

    /// Partially update the tenant's ICP.
    pub async fn update(&self, tenant: TenantId, changes: IcpUpdate) -> ServiceResult<Icp> {
        let changes = changes.validated()?;
        let mut tx = self.pool.begin().await?;
        let mut repo = IcpRepo::new(&mut tx);
        let mut icp = repo
            .first(tenant)
            .await?
            .ok_or_else(|| DbError::not_found("icp", tenant))?;
        changes.apply(&mut icp);
        let icp = repo.save(&icp).await?;
        tx.commit().await?;
        Ok(icp)
    }
}
