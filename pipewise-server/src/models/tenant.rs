use chrono::{DateTime, Utc};
use pipewise_core::validation::{optional_text, required_text};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{limits, optional_slug, optional_url, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Tenant {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub url: Option<String>,
    pub is_active: bool,
    pub slug: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct TenantCreate {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

impl TenantCreate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            url: None,
            slug: None,
            is_active: true,
        }
    }

    pub fn validated(self) -> Result<Self, ValidationError> {
        Ok(Self {
            name: required_text("name", &self.name, limits::NAME)?,
            description: optional_text("description", self.description.as_deref(), limits::DESCRIPTION)?,
            url: optional_url("url", self.url)?,
            slug: optional_slug(self.slug)?,
            is_active: self.is_active,
        })
    }
}

/// Partial update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TenantUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub slug: Option<String>,
    pub is_active: Option<bool>,
}

impl TenantUpdate {
    pub fn validated(self) -> Result<Self, ValidationError> {
        Ok(Self {
            name: self
                .name
                .as_deref()
                .map(|n| required_text("name", n, limits::NAME))
                .transpose()?,
            description: optional_text("description", self.description.as_deref(), limits::DESCRIPTION)?,
            url: optional_url("url", self.url)?,
            slug: optional_slug(self.slug)?,
            is_active: self.is_active,
        })
    }
}
