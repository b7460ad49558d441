//! User administration within the caller's tenant (superusers only)

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use crate::http::error::ApiError;
use crate::http::extractors::{Superuser, ValidUuid};
use crate::http::server::AppState;
use crate::models::{Paginated, PaginationParams, User, UserCreate, UserUpdate};
use crate::services::UserService;

async fn list_users(
    State(state): State<Arc<AppState>>,
    Superuser(admin): Superuser,
    Query(params): Query<PaginationParams>,
) -> Result<Json<Paginated<User>>, ApiError> {
    let users = UserService::new(&state.pool, state.session_ttl())
        .list(admin.tenant(), params.into())
        .await?;
    Ok(Json(users))
}

async fn create_user(
    State(state): State<Arc<AppState>>,
    Superuser(admin): Superuser,
    Json(req): Json<UserCreate>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let user = UserService::new(&state.pool, state.session_ttl())
        .create(admin.tenant(), req)
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn get_user(
    State(state): State<Arc<AppState>>,
    Superuser(admin): Superuser,
    ValidUuid(id): ValidUuid,
) -> Result<Json<User>, ApiError> {
    let user = UserService::new(&state.pool, state.session_ttl())
        .get(admin.tenant(), id)
        .await?;
    Ok(Json(user))
}

async fn update_user(
    State(state): State<Arc<AppState>>,
    Superuser(admin): Superuser,
    ValidUuid(id): ValidUuid,
    Json(req): Json<UserUpdate>,
) -> Result<Json<User>, ApiError> {
    let user = UserService::new(&state.pool, state.session_ttl())
        .update(admin.tenant(), id, req)
        .await?;
    Ok(Json(user))
}

async fn delete_user(
    State(state): State<Arc<AppState>>,
    Superuser(admin): Superuser,
    ValidUuid(id): ValidUuid,
) -> Result<StatusCode, ApiError> {
    UserService::new(&state.pool, state.session_ttl())
        .delete(admin.tenant(), id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/{user_id}",
            get(get_user).patch(update_user).delete(delete_user),
        )
}
