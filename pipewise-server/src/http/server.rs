//! Axum server setup
//!
//! Server skeleton with:
//! - Localhost-only CORS by default
//! - Tracing middleware
//! - Graceful shutdown on SIGTERM/Ctrl+C

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::http::{HeaderValue, Uri};
use axum::Router;
use pipewise_core::Settings;
use pipewise_extract::JobPostExtractor;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::error::ApiError;
use super::routes;
use crate::vite::{ViteError, ViteLoader};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to (default: 127.0.0.1:8000)
    pub bind_addr: SocketAddr,

    /// Allow permissive CORS (default: false = localhost only)
    ///
    /// WARNING: Setting this to true allows any origin.
    pub cors_permissive: bool,

    /// Directory with the built frontend, served as static files
    pub public_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8000)),
            cors_permissive: false,
            public_dir: PathBuf::from("public"),
        }
    }
}

impl From<&Settings> for ServerConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            bind_addr: settings.server.bind,
            cors_permissive: settings.server.cors_permissive,
            public_dir: settings.server.public_dir.clone(),
        }
    }
}

/// Shared application state
pub struct AppState {
    pub pool: PgPool,
    pub settings: Settings,
    pub vite: ViteLoader,
    /// `None` when no OpenAI key is configured
    pub extractor: Option<JobPostExtractor>,
}

impl AppState {
    /// Build state from settings: loads the Vite manifest and, when a key
    /// is configured, the job post extractor.
    pub fn new(pool: PgPool, settings: Settings) -> Result<Self, ServerError> {
        let vite = ViteLoader::load(&settings.vite)?;
        let extractor = match JobPostExtractor::from_settings(&settings.openai) {
            Ok(extractor) => Some(extractor),
            Err(e) => {
                tracing::info!(reason = %e, "job post extraction disabled");
                None
            }
        };
        Ok(Self {
            pool,
            settings,
            vite,
            extractor,
        })
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.settings.auth.session_ttl_hours)
    }

    pub fn logo_dev_token(&self) -> Option<&str> {
        self.settings.logo_dev_token.as_deref()
    }
}

fn cors_layer(permissive: bool, bind: SocketAddr) -> CorsLayer {
    if permissive {
        tracing::warn!("CORS: Permissive mode enabled - all origins allowed");
        return CorsLayer::permissive();
    }
    let port = bind.port();
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000".to_string(),
        "http://127.0.0.1:3000".to_string(),
        format!("http://localhost:{port}"),
        format!("http://127.0.0.1:{port}"),
    ]
    .iter()
    .filter_map(|origin| origin.parse().ok())
    .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Unknown API paths answer JSON, not the frontend shell.
async fn api_not_found(uri: Uri) -> ApiError {
    ApiError::NotFound {
        resource: "route",
        id: uri.path().to_string(),
    }
}

/// The application router with all layers applied.
pub fn build_router(state: Arc<AppState>, config: &ServerConfig) -> Router {
    let api = Router::new()
        .merge(routes::access::router())
        .merge(routes::users::router())
        .merge(routes::roles::router())
        .merge(routes::tenants::router())
        .merge(routes::teams::router())
        .merge(routes::tags::router())
        .merge(routes::companies::router())
        .merge(routes::people::router())
        .merge(routes::jobs::router())
        .merge(routes::opportunities::router())
        .merge(routes::icp::router())
        .fallback(api_not_found);

    Router::new()
        .merge(routes::health::router())
        .nest("/api", api)
        .merge(routes::pages::router(&state.settings.vite.assets_path, &config.public_dir))
        .layer(cors_layer(config.cors_permissive, config.bind_addr))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the HTTP server.
///
/// # Example
///
/// ```ignore
/// let pool = create_pool(&database_url).await?;
/// let state = AppState::new(pool, settings)?;
/// run_server(state, ServerConfig::default()).await?;
/// ```
pub async fn run_server(state: AppState, config: ServerConfig) -> Result<(), ServerError> {
    let app = build_router(Arc::new(state), &config);

    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting shutdown");
        }
    }
}

/// Server error type
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Vite(#[from] ViteError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr.port(), 8000);
        assert!(!config.cors_permissive);
    }

    #[test]
    fn config_from_settings() {
        let mut settings = Settings::default();
        settings.server.cors_permissive = true;
        settings.server.public_dir = PathBuf::from("dist");
        let config = ServerConfig::from(&settings);
        assert!(config.cors_permissive);
        assert_eq!(config.public_dir, PathBuf::from("dist"));
    }
}
