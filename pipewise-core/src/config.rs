//! Runtime settings
//!
//! Resolution order, later wins:
//! 1. built-in defaults
//! 2. TOML file (`PIPEWISE_CONFIG`, else `./pipewise.toml` when present)
//! 3. environment variables (a `.env` file is loaded first)

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "pipewise.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid TOML in {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub server: ServerSettings,
    pub log: LogSettings,
    pub vite: ViteSettings,
    pub openai: OpenAiSettings,
    pub auth: AuthSettings,
    /// Token for logo.dev company pictures
    pub logo_dev_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    pub max_connections: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind: SocketAddr,
    /// Allow any CORS origin. Development only.
    pub cors_permissive: bool,
    /// Directory served under the Vite assets path
    pub public_dir: PathBuf,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8000)),
            cors_permissive: false,
            public_dir: PathBuf::from("public"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "compact" | "console" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{other}' (expected compact or json)")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Default filter when `RUST_LOG` is unset
    pub level: String,
    pub format: LogFormat,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
        }
    }
}

/// Vite asset bridge settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViteSettings {
    /// Serve assets from the Vite dev server instead of the manifest
    pub hot_reload: bool,
    pub is_react: bool,
    /// URL prefix for built assets
    pub assets_path: String,
    pub manifest_path: PathBuf,
    pub host: String,
    pub protocol: String,
    pub port: u16,
}

impl Default for ViteSettings {
    fn default() -> Self {
        Self {
            hot_reload: false,
            is_react: false,
            assets_path: "/static/".to_string(),
            manifest_path: PathBuf::from("public/.vite/manifest.json"),
            host: "localhost".to_string(),
            protocol: "http".to_string(),
            port: 3000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

impl Default for OpenAiSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    pub session_ttl_hours: i64,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            session_ttl_hours: 24 * 7,
        }
    }
}

fn parse_value<T>(key: &'static str, raw: String) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key,
        value: raw.clone(),
        reason: e.to_string(),
    })
}

fn parse_bool(key: &'static str, raw: String) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: raw,
            reason: "expected a boolean".to_string(),
        }),
    }
}

impl Settings {
    /// Load settings from the config file and process environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let path = std::env::var("PIPEWISE_CONFIG")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                default.exists().then_some(default)
            });

        let mut settings = match path {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        settings.apply_overrides(|key| std::env::var(key).ok())?;

        tracing::debug!(
            bind = %settings.server.bind,
            hot_reload = settings.vite.hot_reload,
            "settings loaded"
        );
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply environment-style overrides looked up through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Some(v) = lookup("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse_value("DATABASE_MAX_CONNECTIONS", v)?;
        }
        if let Some(v) = lookup("PIPEWISE_BIND") {
            self.server.bind = parse_value("PIPEWISE_BIND", v)?;
        }
        if let Some(v) = lookup("PIPEWISE_CORS_PERMISSIVE") {
            self.server.cors_permissive = parse_bool("PIPEWISE_CORS_PERMISSIVE", v)?;
        }
        if let Some(v) = lookup("PUBLIC_DIR") {
            self.server.public_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            self.log.level = v;
        }
        if let Some(v) = lookup("LOG_FORMAT") {
            self.log.format = parse_value("LOG_FORMAT", v)?;
        }
        if let Some(v) = lookup("VITE_HOT_RELOAD") {
            self.vite.hot_reload = parse_bool("VITE_HOT_RELOAD", v)?;
        }
        if let Some(v) = lookup("VITE_IS_REACT") {
            self.vite.is_react = parse_bool("VITE_IS_REACT", v)?;
        }
        if let Some(v) = lookup("VITE_MANIFEST_PATH") {
            self.vite.manifest_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("VITE_PORT") {
            self.vite.port = parse_value("VITE_PORT", v)?;
        }
        if let Some(v) = lookup("OPENAI_API_KEY") {
            self.openai.api_key = Some(v);
        }
        if let Some(v) = lookup("OPENAI_MODEL_NAME") {
            self.openai.model = v;
        }
        if let Some(v) = lookup("OPENAI_BASE_URL") {
            self.openai.base_url = v;
        }
        if let Some(v) = lookup("SESSION_TTL_HOURS") {
            self.auth.session_ttl_hours = parse_value("SESSION_TTL_HOURS", v)?;
        }
        if let Some(v) = lookup("LOGO_DEV_TOKEN") {
            self.logo_dev_token = Some(v);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let settings = Settings::default();
        assert_eq!(settings.database.max_connections, 5);
        assert_eq!(settings.server.bind.port(), 8000);
        assert_eq!(settings.vite.assets_path, "/static/");
        assert_eq!(settings.vite.port, 3000);
        assert_eq!(settings.log.format, LogFormat::Compact);
    }

    #[test]
    fn file_values_merge_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[server]
bind = "0.0.0.0:9000"

[vite]
hot_reload = true
"#
        )
        .unwrap();

        let settings = Settings::from_file(file.path()).unwrap();
        assert_eq!(settings.server.bind.port(), 9000);
        assert!(settings.vite.hot_reload);
        // Untouched sections keep defaults
        assert_eq!(settings.openai.model, "gpt-4o-mini");
    }

    #[test]
    fn invalid_toml_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server\nbind = ").unwrap();
        let err = Settings::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn env_overrides_win() {
        let mut settings = Settings::default();
        settings
            .apply_overrides(lookup(&[
                ("DATABASE_URL", "postgres://localhost/pipewise"),
                ("VITE_HOT_RELOAD", "true"),
                ("LOG_FORMAT", "json"),
                ("SESSION_TTL_HOURS", "12"),
            ]))
            .unwrap();

        assert_eq!(
            settings.database.url.as_deref(),
            Some("postgres://localhost/pipewise")
        );
        assert!(settings.vite.hot_reload);
        assert_eq!(settings.log.format, LogFormat::Json);
        assert_eq!(settings.auth.session_ttl_hours, 12);
    }

    #[test]
    fn invalid_override_is_reported() {
        let mut settings = Settings::default();
        let err = settings
            .apply_overrides(lookup(&[("VITE_PORT", "not-a-port")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "VITE_PORT", .. }));

        let err = settings
            .apply_overrides(lookup(&[("VITE_IS_REACT", "maybe")]))
            .unwrap_err();
        assert!(err.to_string().contains("VITE_IS_REACT"));
    }
}
