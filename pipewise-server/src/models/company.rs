use chrono::{DateTime, Utc};
use pipewise_core::validation::{optional_text, required_text};
use pipewise_core::{CompanyFacts, Funding, Location};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{limits, optional_slug, optional_url, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub company_type: Option<String>,
    pub industry: Option<String>,
    pub headcount: Option<i64>,
    pub founded_year: Option<i32>,
    pub url: Option<String>,
    pub profile_pic_url: Option<String>,
    pub linkedin_profile_url: Option<String>,
    pub hq_location: Option<Location>,
    pub last_funding: Option<Funding>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Company {
    /// The attributes ICP company criteria are evaluated against.
    pub fn facts(&self) -> CompanyFacts<'_> {
        CompanyFacts {
            industry: self.industry.as_deref(),
            headcount: self.headcount,
            hq_location: self.hq_location.as_ref(),
            last_funding: self.last_funding.as_ref(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompanyCreate {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub company_type: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub headcount: Option<i64>,
    #[serde(default)]
    pub founded_year: Option<i32>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub profile_pic_url: Option<String>,
    #[serde(default)]
    pub linkedin_profile_url: Option<String>,
    #[serde(default)]
    pub hq_location: Option<Location>,
    #[serde(default)]
    pub last_funding: Option<Funding>,
}

fn non_negative(field: &'static str, value: Option<i64>) -> Result<Option<i64>, ValidationError> {
    match value {
        Some(v) if v < 0 => Err(ValidationError::InvalidFormat {
            field,
            reason: "must not be negative",
        }),
        other => Ok(other),
    }
}

impl CompanyCreate {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn validated(self) -> Result<Self, ValidationError> {
        Ok(Self {
            name: required_text("name", &self.name, limits::NAME)?,
            slug: optional_slug(self.slug)?,
            description: optional_text("description", self.description.as_deref(), limits::DESCRIPTION)?,
            company_type: optional_text("company_type", self.company_type.as_deref(), limits::NAME)?,
            industry: optional_text("industry", self.industry.as_deref(), limits::NAME)?,
            headcount: non_negative("headcount", self.headcount)?,
            founded_year: self.founded_year,
            url: optional_url("url", self.url)?,
            profile_pic_url: optional_url("profile_pic_url", self.profile_pic_url)?,
            linkedin_profile_url: optional_url("linkedin_profile_url", self.linkedin_profile_url)?,
            hq_location: self.hq_location.filter(|l| !l.is_empty()),
            last_funding: self.last_funding,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompanyUpdate {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub company_type: Option<String>,
    pub industry: Option<String>,
    pub headcount: Option<i64>,
    pub founded_year: Option<i32>,
    pub url: Option<String>,
    pub profile_pic_url: Option<String>,
    pub linkedin_profile_url: Option<String>,
    pub hq_location: Option<Location>,
    pub last_funding: Option<Funding>,
}

impl CompanyUpdate {
    pub fn validated(self) -> Result<Self, ValidationError> {
        Ok(Self {
            name: self
                .name
                .as_deref()
                .map(|n| required_text("name", n, limits::NAME))
                .transpose()?,
            slug: optional_slug(self.slug)?,
            description: optional_text("description", self.description.as_deref(), limits::DESCRIPTION)?,
            company_type: optional_text("company_type", self.company_type.as_deref(), limits::NAME)?,
            industry: optional_text("industry", self.industry.as_deref(), limits::NAME)?,
            headcount: non_negative("headcount", self.headcount)?,
            founded_year: self.founded_year,
            url: optional_url("url", self.url)?,
            profile_pic_url: optional_url("profile_pic_url", self.profile_pic_url)?,
            linkedin_profile_url: optional_url("linkedin_profile_url", self.linkedin_profile_url)?,
            hq_location: self.hq_location,
            last_funding: self.last_funding,
        })
    }
}
