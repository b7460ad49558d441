use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use crate::http::error::ApiError;
use crate::http::extractors::CurrentUser;
use crate::http::server::AppState;
use crate::models::{Icp, IcpCreate, IcpUpdate};
use crate::services::IcpService;

/// GET /icp - the caller's tenant ICP
async fn get_icp(State(state): State<Arc<AppState>>, current: CurrentUser) -> Result<Json<Icp>, ApiError> {
    Ok(Json(IcpService::new(&state.pool).get(current.tenant()).await?))
}

async fn create_icp(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Json(req): Json<IcpCreate>,
) -> Result<(StatusCode, Json<Icp>), ApiError> {
    let icp = IcpService::new(&state.pool).create(current.tenant(), req).await?;
    Ok((StatusCode::CREATED, Json(icp)))
}

async fn update_icp(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Json(req): Json<IcpUpdate>,
) -> Result<Json<Icp>, ApiError> {
    Ok(Json(IcpService::new(&state.pool).update(current.tenant(), req).await?))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/icp", get(get_icp).post(create_icp).put(update_icp))
}
