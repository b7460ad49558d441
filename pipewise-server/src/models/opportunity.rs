//! Opportunities and their eager-loaded detail view

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use pipewise_core::codec::{deserialize_column, deserialize_list_column};
use pipewise_core::validation::required_text;
use pipewise_core::{IcpMatch, Location, OpportunityStage, Tool};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use super::{limits, optional_slug, ValidationError};

const MAX_NOTES_LEN: usize = 10_000;
const MAX_SEARCH_LEN: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Opportunity {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub stage: OpportunityStage,
    pub notes: Option<String>,
    pub owner_id: Option<Uuid>,
    pub company_id: Option<Uuid>,
    pub tenant_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A linked person, as aggregated into the detail row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactSummary {
    pub id: Uuid,
    pub slug: String,
    pub full_name: Option<String>,
    pub title: Option<String>,
    pub linkedin_profile_url: Option<String>,
    #[serde(default, deserialize_with = "deserialize_column")]
    pub location: Option<Location>,
}

/// A linked job post, as aggregated into the detail row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPostSummary {
    pub id: Uuid,
    pub title: String,
    pub url: Option<String>,
    pub body: Option<String>,
    #[serde(default, deserialize_with = "deserialize_column")]
    pub location: Option<Location>,
    #[serde(default, deserialize_with = "deserialize_list_column")]
    pub tools: Vec<Tool>,
    pub company_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AuditLogEntry {
    pub id: Uuid,
    pub operation: String,
    pub diff: Option<serde_json::Value>,
    pub user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpportunityDetail {
    #[serde(flatten)]
    pub opportunity: Opportunity,
    pub contacts: Vec<ContactSummary>,
    pub job_posts: Vec<JobPostSummary>,
    pub logs: Vec<AuditLogEntry>,
    /// Fit against the tenant's ICP, when the tenant has one.
    pub icp_match: Option<IcpMatch>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpportunityCreate {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub stage: OpportunityStage,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub owner_id: Option<Uuid>,
    #[serde(default)]
    pub company_id: Option<Uuid>,
    #[serde(default)]
    pub contact_ids: Vec<Uuid>,
    #[serde(default)]
    pub job_post_ids: Vec<Uuid>,
}

/// Drop repeated ids, keeping first occurrences in order.
fn unique(ids: Vec<Uuid>) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

fn notes(value: Option<String>) -> Result<Option<String>, ValidationError> {
    match value {
        Some(n) if n.chars().count() > MAX_NOTES_LEN => Err(ValidationError::TooLong {
            field: "notes",
            max: MAX_NOTES_LEN,
        }),
        other => Ok(other),
    }
}

impl OpportunityCreate {
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
            notes: notes(self.notes)?,
            contact_ids: unique(self.contact_ids),
            job_post_ids: unique(self.job_post_ids),
            ..self
        })
    }
}

/// `Some(None)` for an explicit JSON `null`, `None` when the key is absent.
fn explicit_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Partial update. `notes`, `owner_id` and `company_id` distinguish an
/// absent key (unchanged) from `null` (cleared).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpportunityUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub stage: Option<OpportunityStage>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub notes: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub owner_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub company_id: Option<Option<Uuid>>,
    #[serde(default)]
    pub contact_ids: Option<Vec<Uuid>>,
    #[serde(default)]
    pub job_post_ids: Option<Vec<Uuid>>,
}

impl OpportunityUpdate {
    pub fn validated(self) -> Result<Self, ValidationError> {
        Ok(Self {
            name: self
                .name
                .as_deref()
                .map(|n| required_text("name", n, limits::NAME))
                .transpose()?,
            slug: optional_slug(self.slug)?,
            notes: self.notes.map(notes).transpose()?,
            contact_ids: self.contact_ids.map(unique),
            job_post_ids: self.job_post_ids.map(unique),
            ..self
        })
    }
}

/// List filters, from the query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpportunityFilter {
    pub stage: Option<OpportunityStage>,
    pub company_id: Option<Uuid>,
    pub owner_id: Option<Uuid>,
    /// Case-insensitive substring of the name.
    pub search: Option<String>,
}

impl OpportunityFilter {
    pub fn validated(self) -> Result<Self, ValidationError> {
        let search = match self.search.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(s) if s.chars().count() > MAX_SEARCH_LEN => {
                return Err(ValidationError::TooLong {
                    field: "search",
                    max: MAX_SEARCH_LEN,
                })
            }
            Some(s) => Some(s.to_string()),
        };
        Ok(Self { search, ..self })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn update_distinguishes_null_from_absent() {
        let cleared: OpportunityUpdate = serde_json::from_value(json!({"notes": null})).unwrap();
        assert_eq!(cleared.notes, Some(None));

        let untouched: OpportunityUpdate = serde_json::from_value(json!({"name": "X"})).unwrap();
        assert_eq!(untouched.notes, None);
    }

    #[test]
    fn create_defaults_to_identified() {
        let create: OpportunityCreate = serde_json::from_value(json!({"name": "Acme"})).unwrap();
        let create = create.validated().unwrap();
        assert_eq!(create.stage, OpportunityStage::Identified);
        assert_eq!(create.notes, None);
    }

    #[test]
    fn unknown_stage_rejected() {
        let err = serde_json::from_value::<OpportunityCreate>(json!({"name": "A", "stage": "won"}));
        assert!(err.is_err());
    }

    #[test]
    fn repeated_links_collapsed() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let create = OpportunityCreate {
            contact_ids: vec![a, b, a],
            ..OpportunityCreate::named("Acme")
        }
        .validated()
        .unwrap();
        assert_eq!(create.contact_ids, vec![a, b]);
    }

    #[test]
    fn blank_search_ignored() {
        let filter = OpportunityFilter {
            search: Some("   ".into()),
            ..Default::default()
        };
        assert_eq!(filter.validated().unwrap().search, None);
    }

    #[test]
    fn contact_summary_decodes_stored_location() {
        let contact: ContactSummary = serde_json::from_value(json!({
            "id": Uuid::nil(),
            "slug": "ada-lovelace",
            "full_name": "Ada Lovelace",
            "title": null,
            "linkedin_profile_url": null,
            "location": {}
        }))
        .unwrap();
        assert_eq!(contact.location, None);
    }

    #[test]
    fn job_post_summary_rejects_bad_tools_shape() {
        let result = serde_json::from_value::<JobPostSummary>(json!({
            "id": Uuid::nil(),
            "title": "Engineer",
            "url": null,
            "body": null,
            "location": null,
            "tools": "rust",
            "company_id": null
        }));
        assert!(result.is_err());
    }
}
