//! Company endpoints. Companies are shared reference data.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use crate::http::error::ApiError;
use crate::http::extractors::{CurrentUser, ValidUuid};
use crate::http::server::AppState;
use crate::models::{Company, CompanyCreate, CompanyUpdate, Paginated, PaginationParams};
use crate::services::CompanyService;

#[derive(Debug, Default, Deserialize)]
pub struct CompanySearch {
    /// Case-insensitive substring of the name
    pub search: Option<String>,
}

async fn list_companies(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Query(params): Query<PaginationParams>,
    Query(filter): Query<CompanySearch>,
) -> Result<Json<Paginated<Company>>, ApiError> {
    let search = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let companies = CompanyService::new(&state.pool, state.logo_dev_token())
        .list(search, params.into())
        .await?;
    Ok(Json(companies))
}

async fn create_company(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Json(req): Json<CompanyCreate>,
) -> Result<(StatusCode, Json<Company>), ApiError> {
    let company = CompanyService::new(&state.pool, state.logo_dev_token())
        .create(req)
        .await?;
    Ok((StatusCode::CREATED, Json(company)))
}

async fn get_company(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    ValidUuid(id): ValidUuid,
) -> Result<Json<Company>, ApiError> {
    let company = CompanyService::new(&state.pool, state.logo_dev_token())
        .get(id)
        .await?;
    Ok(Json(company))
}

async fn update_company(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    ValidUuid(id): ValidUuid,
    Json(req): Json<CompanyUpdate>,
) -> Result<Json<Company>, ApiError> {
    let company = CompanyService::new(&state.pool, state.logo_dev_token())
        .update(id, req)
        .await?;
    Ok(Json(company))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/companies", get(list_companies).post(create_company))
        .route("/companies/{company_id}", get(get_company).patch(update_company))
}
