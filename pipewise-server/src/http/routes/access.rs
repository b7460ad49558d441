//! Login, logout, signup and the caller's profile

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

use crate::http::error::ApiError;
use crate::http::extractors::CurrentUser;
use crate::http::server::AppState;
use crate::models::{Login, Signup, TokenResponse, User};
use crate::services::users::Profile;
use crate::services::UserService;

#[derive(Serialize)]
pub struct SignupResponse {
    pub user: User,
    #[serde(flatten)]
    pub token: TokenResponse,
}

/// POST /access/login
async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<Login>,
) -> Result<Json<TokenResponse>, ApiError> {
    let token = UserService::new(&state.pool, state.session_ttl())
        .login(&req.email, &req.password)
        .await?;
    Ok(Json(token))
}

/// POST /access/logout - revoke the presented token
async fn logout(State(state): State<Arc<AppState>>, current: CurrentUser) -> Result<StatusCode, ApiError> {
    UserService::new(&state.pool, state.session_ttl())
        .logout(&current.token)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /access/signup - new tenant with its first user
async fn signup(
    State(state): State<Arc<AppState>>,
    Json(req): Json<Signup>,
) -> Result<(StatusCode, Json<SignupResponse>), ApiError> {
    let (user, token) = UserService::new(&state.pool, state.session_ttl())
        .signup(req)
        .await?;
    Ok((StatusCode::CREATED, Json(SignupResponse { user, token })))
}

/// GET /me
async fn me(State(state): State<Arc<AppState>>, current: CurrentUser) -> Result<Json<Profile>, ApiError> {
    let profile = UserService::new(&state.pool, state.session_ttl())
        .profile(current.user)
        .await?;
    Ok(Json(profile))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/access/login", post(login))
        .route("/access/logout", post(logout))
        .route("/access/signup", post(signup))
        .route("/me", get(me))
}
