use std::borrow::Cow;

use async_trait::async_trait;
use pipewise_core::{Scope, TenantId};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::{insert_with_unique_slug, slug_for_update, ServiceResult, SlugInsert};
use crate::db::repos::{TeamRepo, UserRepo};
use crate::db::slugs::SlugTable;
use crate::db::DbError;
use crate::models::{Paginated, Pagination, Team, TeamCreate, TeamMember, TeamMemberAdd, TeamUpdate};

struct NewTeam<'a> {
    tenant: TenantId,
    input: &'a TeamCreate,
}

#[async_trait]
impl SlugInsert for NewTeam<'_> {
    type Output = Team;

    const TABLE: SlugTable = SlugTable::Team;

    fn slug_source(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.input.name)
    }

    fn requested_slug(&self) -> Option<&str> {
        self.input.slug.as_deref()
    }

    async fn insert(&self, conn: &mut PgConnection, slug: &str) -> Result<Team, DbError> {
        TeamRepo::new(conn).insert(self.tenant, self.input, slug).await
    }
}

pub struct TeamService<'a> {
    pool: &'a PgPool,
}

impl<'a> TeamService<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, tenant: TenantId, input: TeamCreate) -> ServiceResult<Team> {
        let input = input.validated()?;
        let mut tx = self.pool.begin().await?;
        let team = insert_with_unique_slug(&mut tx, Scope::Global, &NewTeam { tenant, input: &input }).await?;
        tx.commit().await?;
        Ok(team)
    }

    pub async fn get(&self, tenant: TenantId, id: Uuid) -> ServiceResult<Team> {
        let mut tx = self.pool.begin().await?;
        let team = TeamRepo::new(&mut tx).get(tenant, id).await?;
        tx.commit().await?;
        Ok(team)
    }

    pub async fn list(&self, tenant: TenantId, page: Pagination) -> ServiceResult<Paginated<Team>> {
        let mut tx = self.pool.begin().await?;
        let teams = TeamRepo::new(&mut tx).list(tenant, page).await?;
        tx.commit().await?;
        Ok(teams)
    }

    pub async fn update(&self, tenant: TenantId, id: Uuid, changes: TeamUpdate) -> ServiceResult<Team> {
        let changes = changes.validated()?;
        let mut tx = self.pool.begin().await?;
        let current = TeamRepo::new(&mut tx).get(tenant, id).await?;
        let slug = slug_for_update(
            &mut tx,
            SlugTable::Team,
            Scope::Global,
            id,
            &current.name,
            changes.name.as_deref(),
            changes.slug.as_deref(),
        )
        .await?;
        let team = TeamRepo::new(&mut tx).update(tenant, id, &changes, slug.as_deref()).await?;
        tx.commit().await?;
        Ok(team)
    }

    pub async fn delete(&self, tenant: TenantId, id: Uuid) -> ServiceResult<()> {
        let mut tx = self.pool.begin().await?;
        TeamRepo::new(&mut tx).delete(tenant, id).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Add a user of the same tenant to a team.
    pub async fn add_member(&self, tenant: TenantId, team_id: Uuid, add: TeamMemberAdd) -> ServiceResult<TeamMember> {
        let mut tx = self.pool.begin().await?;
        TeamRepo::new(&mut tx).get(tenant, team_id).await?;
        UserRepo::new(&mut tx).get(tenant, add.user_id).await?;
        let member = TeamRepo::new(&mut tx)
            .add_member(team_id, &add)
            .await
            .map_err(DbError::missing_reference)?;
        tx.commit().await?;
        Ok(member)
    }

    pub async fn remove_member(&self, tenant: TenantId, team_id: Uuid, user_id: Uuid) -> ServiceResult<()> {
        let mut tx = self.pool.begin().await?;
        TeamRepo::new(&mut tx).get(tenant, team_id).await?;
        TeamRepo::new(&mut tx).remove_member(team_id, user_id).await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn members(&self, tenant: TenantId, team_id: Uuid) -> ServiceResult<Vec<TeamMember>> {
        let mut tx = self.pool.begin().await?;
        TeamRepo::new(&mut tx).get(tenant, team_id).await?;
        let members = TeamRepo::new(&mut tx).members(team_id).await?;
        tx.commit().await?;
        Ok(members)
    }
}
