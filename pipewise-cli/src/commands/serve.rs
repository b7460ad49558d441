//! HTTP server command
//!
//! Runs the API, the frontend shell and static assets.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::Parser;
use pipewise_core::Settings;
use pipewise_server::{run_server, AppState, ServerConfig};

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to (default from settings: 127.0.0.1:8000)
    #[arg(long, short = 'b')]
    pub bind: Option<SocketAddr>,

    /// Allow permissive CORS (all origins) - use with caution
    #[arg(long)]
    pub cors_permissive: bool,

    /// Database URL (overrides config/environment)
    #[arg(long)]
    pub database_url: Option<String>,
}

impl ServeArgs {
    fn apply(self, settings: &mut Settings) {
        if let Some(bind) = self.bind {
            settings.server.bind = bind;
        }
        if self.cors_permissive {
            settings.server.cors_permissive = true;
        }
        if let Some(url) = self.database_url {
            settings.database.url = Some(url);
        }
    }
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs, mut settings: Settings) -> Result<()> {
    args.apply(&mut settings);

    tracing::info!("Starting pipewise server on {}", settings.server.bind);

    let pool = super::connect(&settings).await?;
    let config = ServerConfig::from(&settings);
    let state = AppState::new(pool, settings).context("Failed to initialize server state")?;

    // Blocks until shutdown
    run_server(state, config).await.context("Server error")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_settings() {
        let mut settings = Settings::default();
        let args = ServeArgs {
            bind: Some("0.0.0.0:9000".parse().unwrap()),
            cors_permissive: true,
            database_url: Some("postgres://localhost/pipewise".into()),
        };
        args.apply(&mut settings);
        assert_eq!(settings.server.bind.port(), 9000);
        assert!(settings.server.cors_permissive);
        assert_eq!(settings.database.url.as_deref(), Some("postgres://localhost/pipewise"));
    }

    #[test]
    fn absent_flags_keep_settings() {
        let mut settings = Settings::default();
        settings.server.cors_permissive = true;
        ServeArgs {
            bind: None,
            cors_permissive: false,
            database_url: None,
        }
        .apply(&mut settings);
        assert!(settings.server.cors_permissive);
        assert_eq!(settings.server.bind.port(), 8000);
    }
}
