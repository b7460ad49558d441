//! Opportunity endpoints, scoped to the caller's tenant

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use crate::http::error::ApiError;
use crate::http::extractors::{CurrentUser, ValidUuid};
use crate::http::server::AppState;
use crate::models::{
    Opportunity, OpportunityCreate, OpportunityDetail, OpportunityFilter, OpportunityUpdate,
    Paginated, PaginationParams,
};
use crate::services::OpportunityService;

/// GET /opportunities?stage=&company_id=&owner_id=&search=&page=&per_page=
async fn list_opportunities(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Query(params): Query<PaginationParams>,
    Query(filter): Query<OpportunityFilter>,
) -> Result<Json<Paginated<Opportunity>>, ApiError> {
    let page = OpportunityService::new(&state.pool)
        .list(current.tenant(), filter, params.into())
        .await?;
    Ok(Json(page))
}

async fn create_opportunity(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Json(req): Json<OpportunityCreate>,
) -> Result<(StatusCode, Json<OpportunityDetail>), ApiError> {
    let detail = OpportunityService::new(&state.pool)
        .create(current.actor(), req)
        .await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

async fn get_opportunity(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    ValidUuid(id): ValidUuid,
) -> Result<Json<OpportunityDetail>, ApiError> {
    let detail = OpportunityService::new(&state.pool)
        .get(current.tenant(), id)
        .await?;
    Ok(Json(detail))
}

async fn update_opportunity(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    ValidUuid(id): ValidUuid,
    Json(req): Json<OpportunityUpdate>,
) -> Result<Json<OpportunityDetail>, ApiError> {
    let detail = OpportunityService::new(&state.pool)
        .update(current.actor(), id, req)
        .await?;
    Ok(Json(detail))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/opportunities", get(list_opportunities).post(create_opportunity))
        .route(
            "/opportunities/{opportunity_id}",
            get(get_opportunity).patch(update_opportunity),
        )
}
