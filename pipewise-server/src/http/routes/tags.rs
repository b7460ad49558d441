use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use crate::http::error::ApiError;
use crate::http::extractors::{CurrentUser, ValidUuid};
use crate::http::server::AppState;
use crate::models::{Paginated, PaginationParams, Tag, TagCreate};
use crate::services::TagService;

async fn list_tags(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Query(params): Query<PaginationParams>,
) -> Result<Json<Paginated<Tag>>, ApiError> {
    Ok(Json(TagService::new(&state.pool).list(params.into()).await?))
}

async fn create_tag(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Json(req): Json<TagCreate>,
) -> Result<(StatusCode, Json<Tag>), ApiError> {
    let tag = TagService::new(&state.pool).create(req).await?;
    Ok((StatusCode::CREATED, Json(tag)))
}

async fn get_tag(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    ValidUuid(id): ValidUuid,
) -> Result<Json<Tag>, ApiError> {
    Ok(Json(TagService::new(&state.pool).get(id).await?))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/tags", get(list_tags).post(create_tag))
        .route("/tags/{tag_id}", get(get_tag))
}
