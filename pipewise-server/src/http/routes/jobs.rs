//! Job post endpoints, including LLM extraction from a page's HTML

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use pipewise_extract::Extraction;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::http::error::ApiError;
use crate::http::extractors::{CurrentUser, ValidUuid};
use crate::http::server::AppState;
use crate::models::{JobPost, JobPostCreate, Paginated, PaginationParams, ValidationError};
use crate::services::JobPostService;

#[derive(Debug, Default, Deserialize)]
pub struct JobPostFilter {
    pub company_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    pub html: String,
    /// Where the page was fetched from; stored on the job post
    #[serde(default)]
    pub url: Option<String>,
    /// Store a complete extraction as a job post
    #[serde(default)]
    pub persist: bool,
}

#[derive(Debug, Serialize)]
pub struct ExtractResponse {
    pub extraction: Extraction,
    pub job_post: Option<JobPost>,
}

async fn list_jobs(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Query(params): Query<PaginationParams>,
    Query(filter): Query<JobPostFilter>,
) -> Result<Json<Paginated<JobPost>>, ApiError> {
    let jobs = JobPostService::new(&state.pool, state.logo_dev_token())
        .list(filter.company_id, params.into())
        .await?;
    Ok(Json(jobs))
}

async fn create_job(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Json(req): Json<JobPostCreate>,
) -> Result<(StatusCode, Json<JobPost>), ApiError> {
    let job = JobPostService::new(&state.pool, state.logo_dev_token())
        .create(req)
        .await?;
    Ok((StatusCode::CREATED, Json(job)))
}

async fn get_job(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    ValidUuid(id): ValidUuid,
) -> Result<Json<JobPost>, ApiError> {
    let job = JobPostService::new(&state.pool, state.logo_dev_token())
        .get(id)
        .await?;
    Ok(Json(job))
}

/// POST /jobs/extract
async fn extract_job(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Json(req): Json<ExtractRequest>,
) -> Result<Json<ExtractResponse>, ApiError> {
    if req.html.trim().is_empty() {
        return Err(ValidationError::Empty { field: "html" }.into());
    }
    let extractor = state.extractor.as_ref().ok_or_else(|| ApiError::Unavailable {
        message: "job post extraction is not configured".into(),
    })?;

    let extraction = extractor.extract(&req.html).await?;
    let job_post = match (&extraction, req.persist) {
        (Extraction::Complete(details), true) => Some(
            JobPostService::new(&state.pool, state.logo_dev_token())
                .create_from_extraction(details.clone(), req.url, Some(req.html))
                .await?,
        ),
        (Extraction::Incomplete { missing, .. }, _) => {
            tracing::warn!(?missing, "job post extraction incomplete");
            None
        }
        _ => None,
    };

    Ok(Json(ExtractResponse { extraction, job_post }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/jobs", get(list_jobs).post(create_job))
        .route("/jobs/extract", post(extract_job))
        .route("/jobs/{job_post_id}", get(get_job))
}
