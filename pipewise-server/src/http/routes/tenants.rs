//! Tenant administration (superusers only)

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use pipewise_core::TenantId;

use crate::http::error::ApiError;
use crate::http::extractors::{Superuser, ValidUuid};
use crate::http::server::AppState;
use crate::models::{Paginated, PaginationParams, Tenant, TenantCreate, TenantUpdate};
use crate::services::TenantService;

async fn list_tenants(
    State(state): State<Arc<AppState>>,
    _admin: Superuser,
    Query(params): Query<PaginationParams>,
) -> Result<Json<Paginated<Tenant>>, ApiError> {
    Ok(Json(TenantService::new(&state.pool).list(params.into()).await?))
}

async fn create_tenant(
    State(state): State<Arc<AppState>>,
    _admin: Superuser,
    Json(req): Json<TenantCreate>,
) -> Result<(StatusCode, Json<Tenant>), ApiError> {
    let tenant = TenantService::new(&state.pool).create(req).await?;
    Ok((StatusCode::CREATED, Json(tenant)))
}

async fn get_tenant(
    State(state): State<Arc<AppState>>,
    _admin: Superuser,
    ValidUuid(id): ValidUuid,
) -> Result<Json<Tenant>, ApiError> {
    Ok(Json(TenantService::new(&state.pool).get(TenantId::new(id)).await?))
}

async fn update_tenant(
    State(state): State<Arc<AppState>>,
    _admin: Superuser,
    ValidUuid(id): ValidUuid,
    Json(req): Json<TenantUpdate>,
) -> Result<Json<Tenant>, ApiError> {
    let tenant = TenantService::new(&state.pool)
        .update(TenantId::new(id), req)
        .await?;
    Ok(Json(tenant))
}

async fn delete_tenant(
    State(state): State<Arc<AppState>>,
    _admin: Superuser,
    ValidUuid(id): ValidUuid,
) -> Result<StatusCode, ApiError> {
    TenantService::new(&state.pool).delete(TenantId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/tenants", get(list_tenants).post(create_tenant))
        .route(
            "/tenants/{tenant_id}",
            get(get_tenant).patch(update_tenant).delete(delete_tenant),
        )
}
