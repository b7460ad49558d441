//! Frontend shell and built assets
//!
//! Every non-API GET that no other route claims gets the HTML shell, so the
//! client-side router owns the URL space. Built files are served from the
//! public directory under the Vite assets path.

use std::path::Path;
use std::sync::Arc;

use axum::extract::State;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use tower_http::services::ServeDir;

use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::vite::ViteLoader;

/// Entry module of the frontend build
pub const ENTRY: &str = "src/main.tsx";

pub fn render_shell(vite: &ViteLoader) -> Result<String, ApiError> {
    let assets = vite.asset(ENTRY, None)?;
    Ok(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8" />
<meta name="viewport" content="width=device-width, initial-scale=1" />
<title>Pipewise</title>
{refresh}
{hmr}
{assets}
</head>
<body>
<div id="app"></div>
</body>
</html>
"#,
        refresh = vite.react_refresh(),
        hmr = vite.hmr_client(),
    ))
}

async fn index(State(state): State<Arc<AppState>>) -> Result<Html<String>, ApiError> {
    render_shell(&state.vite).map(Html)
}

pub fn router(assets_path: &str, public_dir: &Path) -> Router<Arc<AppState>> {
    let router = Router::new().route("/", get(index)).fallback(index);
    let prefix = assets_path.trim_matches('/');
    if prefix.is_empty() {
        return router;
    }
    router.nest_service(&format!("/{prefix}"), ServeDir::new(public_dir))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipewise_core::config::ViteSettings;

    #[test]
    fn dev_shell_loads_from_vite_server() {
        let settings = ViteSettings {
            hot_reload: true,
            is_react: true,
            ..Default::default()
        };
        let vite = ViteLoader::load(&settings).unwrap();
        let html = render_shell(&vite).unwrap();
        assert!(html.contains("http://localhost:3000/static/@vite/client"));
        assert!(html.contains("http://localhost:3000/static/src/main.tsx"));
        assert!(html.contains("@react-refresh"));
    }
}
