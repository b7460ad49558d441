//! Team repository and memberships

use chrono::{DateTime, Utc};
use pipewise_core::{EnumColumn, TeamRole, TenantId};
use sqlx::{FromRow, PgConnection};
use uuid::Uuid;

use crate::db::scope::{fetch_page, ListQuery};
use crate::db::DbError;
use crate::models::{Paginated, Pagination, Team, TeamCreate, TeamMember, TeamMemberAdd, TeamUpdate};

const COLUMNS: &str = "id, slug, name, description, is_active, tenant_id, created_at, updated_at";

#[derive(FromRow)]
struct MemberRow {
    team_id: Uuid,
    user_id: Uuid,
    role: String,
    is_owner: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<MemberRow> for TeamMember {
    type Error = DbError;

    fn try_from(row: MemberRow) -> Result<Self, Self::Error> {
        Ok(Self {
            team_id: row.team_id,
            user_id: row.user_id,
            role: TeamRole::from_tag(&row.role)?,
            is_owner: row.is_owner,
            created_at: row.created_at,
        })
    }
}

pub struct TeamRepo<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> TeamRepo<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    pub async fn insert(
        &mut self,
        tenant: TenantId,
        input: &TeamCreate,
        slug: &str,
    ) -> Result<Team, DbError> {
        let team = sqlx::query_as::<_, Team>(&format!(
            "INSERT INTO team (slug, name, description, tenant_id) \
             VALUES ($1, $2, $3, $4) RETURNING {COLUMNS}"
        ))
        .bind(slug)
        .bind(&input.name)
        .bind(&input.description)
        .bind(tenant.as_uuid())
        .fetch_one(&mut *self.conn)
        .await?;
        Ok(team)
    }

    pub async fn get(&mut self, tenant: TenantId, id: Uuid) -> Result<Team, DbError> {
        sqlx::query_as::<_, Team>(&format!(
            "SELECT {COLUMNS} FROM team WHERE id = $1 AND tenant_id = $2"
        ))
        .bind(id)
        .bind(tenant.as_uuid())
        .fetch_optional(&mut *self.conn)
        .await?
        .ok_or_else(|| DbError::not_found("team", id))
    }

    pub async fn list(
        &mut self,
        tenant: TenantId,
        page: Pagination,
    ) -> Result<Paginated<Team>, DbError> {
        let query = ListQuery {
            columns: "t.id, t.slug, t.name, t.description, t.is_active, t.tenant_id, \
                      t.created_at, t.updated_at",
            from: "team t",
            alias: "t",
            order_by: "t.name, t.id",
        };
        fetch_page(&mut *self.conn, query, tenant.into(), |_| {}, page).await
    }

    pub async fn update(
        &mut self,
        tenant: TenantId,
        id: Uuid,
        changes: &TeamUpdate,
        slug: Option<&str>,
    ) -> Result<Team, DbError> {
        sqlx::query_as::<_, Team>(&format!(
            "UPDATE team SET \
                name = COALESCE($3, name), \
                description = COALESCE($4, description), \
                is_active = COALESCE($5, is_active), \
                slug = COALESCE($6, slug), \
                updated_at = now() \
             WHERE id = $1 AND tenant_id = $2 RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(tenant.as_uuid())
        .bind(&changes.name)
        .bind(&changes.description)
        .bind(changes.is_active)
        .bind(slug)
        .fetch_optional(&mut *self.conn)
        .await?
        .ok_or_else(|| DbError::not_found("team", id))
    }

    pub async fn delete(&mut self, tenant: TenantId, id: Uuid) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM team WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant.as_uuid())
            .execute(&mut *self.conn)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::not_found("team", id));
        }
        Ok(())
    }

    /// Add a member. The caller has checked that team and user belong to
    /// the acting tenant.
    pub async fn add_member(&mut self, team_id: Uuid, add: &TeamMemberAdd) -> Result<TeamMember, DbError> {
        let row = sqlx::query_as::<_, MemberRow>(
            "INSERT INTO team_member (team_id, user_id, role, is_owner) VALUES ($1, $2, $3, $4) \
             RETURNING team_id, user_id, role, is_owner, created_at",
        )
        .bind(team_id)
        .bind(add.user_id)
        .bind(add.role.as_tag())
        .bind(add.is_owner)
        .fetch_one(&mut *self.conn)
        .await?;
        row.try_into()
    }

    pub async fn remove_member(&mut self, team_id: Uuid, user_id: Uuid) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM team_member WHERE team_id = $1 AND user_id = $2")
            .bind(team_id)
            .bind(user_id)
            .execute(&mut *self.conn)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::not_found("team member", user_id));
        }
        Ok(())
    }

    pub async fn members(&mut self, team_id: Uuid) -> Result<Vec<TeamMember>, DbError> {
        let rows = sqlx::query_as::<_, MemberRow>(
            "SELECT team_id, user_id, role, is_owner, created_at FROM team_member \
             WHERE team_id = $1 ORDER BY created_at",
        )
        .bind(team_id)
        .fetch_all(&mut *self.conn)
        .await?;
        rows.into_iter().map(TeamMember::try_from).collect()
    }
}
