use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::post;
use axum::{Json, Router};

use crate::http::error::ApiError;
use crate::http::extractors::Superuser;
use crate::http::server::AppState;
use crate::models::{RoleAssignment, User};
use crate::services::UserService;

/// POST /roles/{role_slug}/assign
async fn assign(
    State(state): State<Arc<AppState>>,
    Superuser(admin): Superuser,
    Path(role_slug): Path<String>,
    Json(req): Json<RoleAssignment>,
) -> Result<Json<User>, ApiError> {
    let user = UserService::new(&state.pool, state.session_ttl())
        .assign_role(admin.tenant(), &role_slug, &req.user_name)
        .await?;
    Ok(Json(user))
}

/// POST /roles/{role_slug}/revoke
async fn revoke(
    State(state): State<Arc<AppState>>,
    Superuser(admin): Superuser,
    Path(role_slug): Path<String>,
    Json(req): Json<RoleAssignment>,
) -> Result<Json<User>, ApiError> {
    let user = UserService::new(&state.pool, state.session_ttl())
        .revoke_role(admin.tenant(), &role_slug, &req.user_name)
        .await?;
    Ok(Json(user))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/roles/{role_slug}/assign", post(assign))
        .route("/roles/{role_slug}/revoke", post(revoke))
}
