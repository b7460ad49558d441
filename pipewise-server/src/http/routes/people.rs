use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use crate::http::error::ApiError;
use crate::http::extractors::{CurrentUser, ValidUuid};
use crate::http::server::AppState;
use crate::models::{Paginated, PaginationParams, Person, PersonCreate};
use crate::services::PersonService;

#[derive(Debug, Default, Deserialize)]
pub struct PersonFilter {
    pub company_id: Option<Uuid>,
    pub search: Option<String>,
}

async fn list_people(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Query(params): Query<PaginationParams>,
    Query(filter): Query<PersonFilter>,
) -> Result<Json<Paginated<Person>>, ApiError> {
    let search = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let people = PersonService::new(&state.pool)
        .list(filter.company_id, search, params.into())
        .await?;
    Ok(Json(people))
}

async fn create_person(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Json(req): Json<PersonCreate>,
) -> Result<(StatusCode, Json<Person>), ApiError> {
    let person = PersonService::new(&state.pool).create(req).await?;
    Ok((StatusCode::CREATED, Json(person)))
}

async fn get_person(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    ValidUuid(id): ValidUuid,
) -> Result<Json<Person>, ApiError> {
    Ok(Json(PersonService::new(&state.pool).get(id).await?))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/people", get(list_people).post(create_person))
        .route("/people/{person_id}", get(get_person))
}
