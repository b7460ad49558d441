//! Team endpoints, scoped to the caller's tenant

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get};
use axum::{Json, Router};
use uuid::Uuid;

use crate::http::error::ApiError;
use crate::http::extractors::{CurrentUser, ValidUuid};
use crate::http::server::AppState;
use crate::models::{Paginated, PaginationParams, Team, TeamCreate, TeamMember, TeamMemberAdd, TeamUpdate};
use crate::services::TeamService;

async fn list_teams(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Query(params): Query<PaginationParams>,
) -> Result<Json<Paginated<Team>>, ApiError> {
    let teams = TeamService::new(&state.pool)
        .list(current.tenant(), params.into())
        .await?;
    Ok(Json(teams))
}

async fn create_team(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Json(req): Json<TeamCreate>,
) -> Result<(StatusCode, Json<Team>), ApiError> {
    let team = TeamService::new(&state.pool).create(current.tenant(), req).await?;
    Ok((StatusCode::CREATED, Json(team)))
}

async fn get_team(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    ValidUuid(id): ValidUuid,
) -> Result<Json<Team>, ApiError> {
    Ok(Json(TeamService::new(&state.pool).get(current.tenant(), id).await?))
}

async fn update_team(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    ValidUuid(id): ValidUuid,
    Json(req): Json<TeamUpdate>,
) -> Result<Json<Team>, ApiError> {
    let team = TeamService::new(&state.pool)
        .update(current.tenant(), id, req)
        .await?;
    Ok(Json(team))
}

async fn delete_team(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    ValidUuid(id): ValidUuid,
) -> Result<StatusCode, ApiError> {
    TeamService::new(&state.pool).delete(current.tenant(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_members(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    ValidUuid(team_id): ValidUuid,
) -> Result<Json<Vec<TeamMember>>, ApiError> {
    let members = TeamService::new(&state.pool)
        .members(current.tenant(), team_id)
        .await?;
    Ok(Json(members))
}

async fn add_member(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    ValidUuid(team_id): ValidUuid,
    Json(req): Json<TeamMemberAdd>,
) -> Result<(StatusCode, Json<TeamMember>), ApiError> {
    let member = TeamService::new(&state.pool)
        .add_member(current.tenant(), team_id, req)
        .await?;
    Ok((StatusCode::CREATED, Json(member)))
}

/// DELETE /teams/{team_id}/members/{user_id}
async fn remove_member(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path((team_id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    TeamService::new(&state.pool)
        .remove_member(current.tenant(), team_id, user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/teams", get(list_teams).post(create_team))
        .route(
            "/teams/{team_id}",
            get(get_team).patch(update_team).delete(delete_team),
        )
        .route("/teams/{team_id}/members", get(list_members).post(add_member))
        .route("/teams/{team_id}/members/{user_id}", delete(remove_member))
}
