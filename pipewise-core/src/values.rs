//! Structured value objects stored in JSON columns
//!
//! Every field is written on encode (absent values become `null` or `[]`)
//! and every field defaults on decode, so rows written by older builds
//! still decode after a field is added.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::enums::ToolCertainty;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Location {
    pub country: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
}

impl Location {
    pub fn is_empty(&self) -> bool {
        self.country.is_none() && self.region.is_none() && self.city.is_none()
    }
}

/// Most recent funding round of a company
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Funding {
    pub round_name: Option<String>,
    pub money_raised: Option<i64>,
    pub announced_date: Option<NaiveDate>,
    pub investors: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkExperience {
    pub company_name: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<Location>,
    pub starts_at: Option<NaiveDate>,
    pub ends_at: Option<NaiveDate>,
}

impl WorkExperience {
    /// Current position: started and not yet ended.
    pub fn is_current(&self) -> bool {
        self.starts_at.is_some() && self.ends_at.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialActivity {
    pub title: Option<String>,
    pub link: Option<String>,
    pub activity_status: Option<String>,
}

/// A tool mentioned by a job post
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tool {
    pub name: String,
    pub certainty: ToolCertainty,
}

impl Tool {
    pub fn new(name: impl Into<String>, certainty: ToolCertainty) -> Self {
        Self {
            name: name.into(),
            certainty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn every_key_is_written() {
        let value = serde_json::to_value(Location::default()).unwrap();
        assert_eq!(value, json!({"country": null, "region": null, "city": null}));

        let value = serde_json::to_value(Funding::default()).unwrap();
        let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys.len(), 4);
        assert_eq!(value["investors"], json!([]));
    }

    #[test]
    fn missing_keys_default() {
        let funding: Funding = serde_json::from_value(json!({"round_name": "Seed"})).unwrap();
        assert_eq!(funding.round_name.as_deref(), Some("Seed"));
        assert!(funding.investors.is_empty());
        assert_eq!(funding.money_raised, None);
    }

    #[test]
    fn nested_location_in_experience() {
        let exp: WorkExperience = serde_json::from_value(json!({
            "company_name": "Acme",
            "location": {"city": "Berlin"},
            "starts_at": "2021-03-01"
        }))
        .unwrap();
        assert_eq!(exp.location.unwrap().city.as_deref(), Some("Berlin"));
        assert!(exp.starts_at.is_some());
    }

    #[test]
    fn current_position() {
        let mut exp = WorkExperience {
            starts_at: NaiveDate::from_ymd_opt(2020, 1, 1),
            ..Default::default()
        };
        assert!(exp.is_current());
        exp.ends_at = NaiveDate::from_ymd_opt(2022, 1, 1);
        assert!(!exp.is_current());
    }
}
