//! API error type with IntoResponse
//!
//! Errors are converted to `{"error", "message"}` JSON bodies. Anything
//! that is not the caller's fault is logged and reported as a generic 500.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use pipewise_extract::ExtractError;
use serde_json::json;

use crate::auth::AuthError;
use crate::db::DbError;
use crate::models::ValidationError;
use crate::services::ServiceError;
use crate::vite::ViteError;

#[derive(Debug)]
pub enum ApiError {
    /// Validation failed (400)
    Validation(ValidationError),

    /// Missing, expired or wrong credentials (401)
    Unauthorized { message: String },

    /// Authenticated but not allowed (403)
    Forbidden { reason: String },

    /// Resource not found (404)
    NotFound { resource: &'static str, id: String },

    /// Unique or foreign-key constraint violated (409)
    Conflict { constraint: String },

    /// Feature not configured on this server (503)
    Unavailable { message: String },

    /// Internal error (500, logged)
    Internal { message: String },
}

impl ApiError {
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    pub fn internal(err: impl std::fmt::Display) -> Self {
        Self::Internal {
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            Self::Validation(e) => (StatusCode::BAD_REQUEST, "validation_error", e.to_string()),
            Self::Unauthorized { message } => (StatusCode::UNAUTHORIZED, "unauthorized", message),
            Self::Forbidden { reason } => (StatusCode::FORBIDDEN, "forbidden", reason),
            Self::NotFound { resource, id } => (
                StatusCode::NOT_FOUND,
                "not_found",
                format!("{resource} '{id}' not found"),
            ),
            Self::Conflict { constraint } => (
                StatusCode::CONFLICT,
                "conflict",
                format!("conflicts with an existing record ({constraint})"),
            ),
            Self::Unavailable { message } => {
                (StatusCode::SERVICE_UNAVAILABLE, "unavailable", message)
            }
            Self::Internal { message } => {
                tracing::error!(error = %message, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "an internal error occurred".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": code, "message": message }))).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound { resource, id } => Self::NotFound { resource, id },
            DbError::Conflict { constraint } | DbError::ForeignKey { constraint } => {
                Self::Conflict { constraint }
            }
            other => Self::internal(other),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidCredentials => Self::unauthorized("invalid email or password"),
            other => Self::internal(other),
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Validation(e) => e.into(),
            ServiceError::Db(e) => e.into(),
            ServiceError::Auth(e) => e.into(),
        }
    }
}

impl From<ViteError> for ApiError {
    fn from(e: ViteError) -> Self {
        Self::internal(e)
    }
}

impl From<ExtractError> for ApiError {
    fn from(e: ExtractError) -> Self {
        match e {
            ExtractError::MissingApiKey => Self::Unavailable {
                message: e.to_string(),
            },
            other => Self::internal(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn validation_error_is_400() {
        let err = ApiError::Validation(ValidationError::Empty { field: "name" });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "validation_error");
        assert_eq!(body["message"], "name cannot be empty");
    }

    #[tokio::test]
    async fn not_found_keeps_resource() {
        let err: ApiError = DbError::not_found("opportunity", "42").into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"], "not_found");
    }

    #[tokio::test]
    async fn conflict_is_409() {
        let err: ApiError = ServiceError::Db(DbError::Conflict {
            constraint: "uq_tenant_slug".into(),
        })
        .into();
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn foreign_key_is_409_unless_reference_went_missing() {
        let still_referenced: ApiError = DbError::ForeignKey {
            constraint: "user_account_tenant_id_fkey".into(),
        }
        .into();
        assert_eq!(still_referenced.into_response().status(), StatusCode::CONFLICT);

        let missing: ApiError = DbError::ForeignKey {
            constraint: "opportunity_company_id_fkey".into(),
        }
        .missing_reference()
        .into();
        assert_eq!(missing.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn bad_credentials_are_401() {
        let err: ApiError = ServiceError::Auth(AuthError::InvalidCredentials).into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["error"], "unauthorized");
    }

    #[tokio::test]
    async fn internal_details_are_hidden() {
        let err: ApiError = DbError::Sqlx(sqlx::Error::PoolTimedOut).into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["message"], "an internal error occurred");
    }
}
