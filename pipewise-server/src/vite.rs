//! Vite asset bridge
//!
//! Renders the `<script>`/`<link>` tags for a Vite-built frontend. With hot
//! reload on, tags point at the Vite dev server; otherwise they are read
//! from the build manifest, which is loaded once when the loader is built.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use pipewise_core::config::ViteSettings;
use serde::Deserialize;

/// Script attributes used when the caller passes none.
pub const DEFAULT_SCRIPT_ATTRS: &[(&str, &str)] = &[("type", "module"), ("async", ""), ("defer", "")];

#[derive(Debug, thiserror::Error)]
pub enum ViteError {
    #[error("cannot read Vite manifest at {path}: {source}")]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse Vite manifest at {path}: {source}")]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot find {entry} in Vite manifest at {path}")]
    MissingEntry { entry: String, path: PathBuf },
}

/// One chunk of `manifest.json`.
#[derive(Debug, Clone, Deserialize)]
struct ManifestEntry {
    file: String,
    #[serde(default)]
    css: Vec<String>,
    #[serde(default)]
    imports: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ViteLoader {
    settings: ViteSettings,
    manifest: HashMap<String, ManifestEntry>,
}

/// Join a URL prefix and a relative path with exactly one slash.
fn join_path(prefix: &str, path: &str) -> String {
    format!("{}/{}", prefix.trim_end_matches('/'), path.trim_start_matches('/'))
}

fn render_attrs(attrs: &[(&str, &str)]) -> String {
    attrs
        .iter()
        .map(|(key, value)| {
            if value.is_empty() {
                key.to_string()
            } else {
                format!(r#"{key}="{value}""#)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

impl ViteLoader {
    /// Build a loader. The manifest is read unless hot reload is on.
    pub fn load(settings: &ViteSettings) -> Result<Self, ViteError> {
        let manifest = if settings.hot_reload {
            HashMap::new()
        } else {
            let path = &settings.manifest_path;
            let content = std::fs::read_to_string(path).map_err(|source| ViteError::ManifestRead {
                path: path.clone(),
                source,
            })?;
            let manifest: HashMap<String, ManifestEntry> =
                serde_json::from_str(&content).map_err(|source| ViteError::ManifestParse {
                    path: path.clone(),
                    source,
                })?;
            tracing::debug!(path = %path.display(), entries = manifest.len(), "loaded Vite manifest");
            manifest
        };
        Ok(Self {
            settings: settings.clone(),
            manifest,
        })
    }

    pub fn hot_reload(&self) -> bool {
        self.settings.hot_reload
    }

    /// URL of `path` on the Vite dev server.
    pub fn server_url(&self, path: &str) -> String {
        let s = &self.settings;
        format!(
            "{}://{}:{}{}",
            s.protocol,
            s.host,
            s.port,
            join_path(&join_path("", &s.assets_path), path)
        )
    }

    pub fn script_tag(&self, src: &str, attrs: &[(&str, &str)]) -> String {
        let attrs = render_attrs(attrs);
        if attrs.is_empty() {
            format!(r#"<script src="{src}"></script>"#)
        } else {
            format!(r#"<script {attrs} src="{src}"></script>"#)
        }
    }

    pub fn stylesheet_tag(&self, href: &str) -> String {
        format!(r#"<link rel="stylesheet" href="{href}" />"#)
    }

    /// HMR client tag; empty unless hot reload is on.
    pub fn hmr_client(&self) -> String {
        if !self.settings.hot_reload {
            return String::new();
        }
        self.script_tag(&self.server_url("@vite/client"), &[("type", "module")])
    }

    /// React refresh preamble; empty unless hot reload and React are on.
    pub fn react_refresh(&self) -> String {
        if !(self.settings.hot_reload && self.settings.is_react) {
            return String::new();
        }
        format!(
            r#"<script type="module">
import RefreshRuntime from '{}'
RefreshRuntime.injectIntoGlobalHook(window)
window.$RefreshReg$ = () => {{}}
window.$RefreshSig$ = () => (type) => type
window.__vite_plugin_react_preamble_installed__ = true
</script>"#,
            self.server_url("@react-refresh")
        )
    }

    /// All tags needed to include `path`: its stylesheets, its imported
    /// chunks (recursively) and finally its own script.
    pub fn asset(&self, path: &str, attrs: Option<&[(&str, &str)]>) -> Result<String, ViteError> {
        let attrs = attrs.filter(|a| !a.is_empty()).unwrap_or(DEFAULT_SCRIPT_ATTRS);
        if self.settings.hot_reload {
            return Ok(self.script_tag(&self.server_url(path), DEFAULT_SCRIPT_ATTRS));
        }
        let mut tags = Vec::new();
        let mut seen = HashSet::new();
        self.collect_tags(path, attrs, &mut seen, &mut tags)?;
        Ok(tags.join("\n"))
    }

    fn entry(&self, path: &str) -> Result<&ManifestEntry, ViteError> {
        self.manifest.get(path).ok_or_else(|| ViteError::MissingEntry {
            entry: path.to_string(),
            path: self.settings.manifest_path.clone(),
        })
    }

    fn collect_tags<'m>(
        &'m self,
        path: &'m str,
        attrs: &[(&str, &str)],
        seen: &mut HashSet<&'m str>,
        tags: &mut Vec<String>,
    ) -> Result<(), ViteError> {
        if !seen.insert(path) {
            return Ok(());
        }
        let entry = self.entry(path)?;
        for css in &entry.css {
            tags.push(self.stylesheet_tag(&join_path(&self.settings.assets_path, css)));
        }
        for import in &entry.imports {
            self.collect_tags(import, attrs, seen, tags)?;
        }
        tags.push(self.script_tag(&join_path(&self.settings.assets_path, &entry.file), attrs));
        Ok(())
    }

    /// URL of the built file for `path`, without its dependencies.
    pub fn asset_url(&self, path: &str) -> Result<String, ViteError> {
        if self.settings.hot_reload {
            return Ok(self.server_url(path));
        }
        let entry = self.entry(path)?;
        Ok(join_path(&self.settings.assets_path, &entry.file))
    }
}
