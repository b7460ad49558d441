//! Job post details as returned by the model, and their validated form

use pipewise_core::codec;
use pipewise_core::{EnumColumn, Location, Tool, ToolCertainty};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

/// Company block exactly as the model produced it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawCompany {
    pub name: Option<String>,
    pub url: Option<String>,
    pub linkedin_url: Option<String>,
}

/// Unvalidated model output. Every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawJobDetails {
    pub company: Option<RawCompany>,
    pub title: Option<String>,
    #[serde(deserialize_with = "lenient_location")]
    pub location: Option<Location>,
    #[serde(deserialize_with = "lenient_tools")]
    pub tools: Vec<Tool>,
}

/// Tool entry as the model wrote it; either field may be null.
#[derive(Deserialize)]
struct RawTool {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    certainty: Option<String>,
}

/// A location that is not a usable record is dropped, not an error.
fn lenient_location<'de, D>(deserializer: D) -> Result<Option<Location>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match codec::decode::<Location>(value) {
        Ok(location) => Ok(location),
        Err(err) => {
            debug!(%err, "discarding location");
            Ok(None)
        }
    }
}

/// Entries without a name are skipped; a null or unknown certainty is `Low`.
fn lenient_tools<'de, D>(deserializer: D) -> Result<Vec<Tool>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(entries)) => entries,
        Some(Value::Null) | None => return Ok(Vec::new()),
        Some(other) => {
            debug!(value = %other, "discarding tools");
            return Ok(Vec::new());
        }
    };

    Ok(entries
        .into_iter()
        .filter_map(|entry| serde_json::from_value::<RawTool>(entry).ok())
        .filter_map(|raw| {
            let name = raw.name?;
            let certainty = raw
                .certainty
                .and_then(|tag| ToolCertainty::from_tag(tag.trim()).ok())
                .unwrap_or_default();
            Some(Tool::new(name, certainty))
        })
        .collect())
}

/// How the hiring company can be identified: by name, or by both of its
/// URLs when the name could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyRef {
    pub name: Option<String>,
    pub url: Option<String>,
    pub linkedin_url: Option<String>,
}

impl CompanyRef {
    /// Name to derive the company slug from.
    pub fn label(&self) -> &str {
        self.name
            .as_deref()
            .or(self.url.as_deref())
            .or(self.linkedin_url.as_deref())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDetails {
    pub company: CompanyRef,
    pub title: String,
    pub location: Option<Location>,
    pub tools: Vec<Tool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingField {
    Title,
    Company,
    /// Company has neither a name nor both URLs
    CompanyIdentity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Extraction {
    Complete(JobDetails),
    Incomplete {
        details: RawJobDetails,
        missing: Vec<MissingField>,
    },
}

impl Extraction {
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete(_))
    }
}

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("null"))
}

impl RawJobDetails {
    /// Blank strings and empty records count as missing.
    fn normalized(self) -> Self {
        Self {
            company: self.company.map(|c| RawCompany {
                name: present(c.name),
                url: present(c.url),
                linkedin_url: present(c.linkedin_url),
            }),
            title: present(self.title),
            location: self.location.filter(|l| !l.is_empty()),
            tools: self
                .tools
                .into_iter()
                .filter(|t| !t.name.trim().is_empty())
                .collect(),
        }
    }

    pub fn validate(self) -> Extraction {
        let raw = self.normalized();
        let mut missing = Vec::new();

        if raw.title.is_none() {
            missing.push(MissingField::Title);
        }
        match &raw.company {
            None => missing.push(MissingField::Company),
            Some(c) if c.name.is_none() && (c.url.is_none() || c.linkedin_url.is_none()) => {
                missing.push(MissingField::CompanyIdentity)
            }
            Some(_) => {}
        }

        match (raw.title.clone(), raw.company.clone()) {
            (Some(title), Some(company)) if missing.is_empty() => Extraction::Complete(JobDetails {
                company: CompanyRef {
                    name: company.name,
                    url: company.url,
                    linkedin_url: company.linkedin_url,
                },
                title,
                location: raw.location,
                tools: raw.tools,
            }),
            _ => Extraction::Incomplete {
                details: raw,
                missing,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipewise_core::ToolCertainty;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> RawJobDetails {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn complete_with_company_name() {
        let raw = parse(json!({
            "company": {"name": "Acme", "url": null, "linkedin_url": null},
            "title": "Platform Engineer",
            "location": {"country": "Germany", "region": null, "city": "Berlin"},
            "tools": [{"name": "Rust", "certainty": "High"}]
        }));

        let Extraction::Complete(details) = raw.validate() else {
            panic!("expected complete extraction");
        };
        assert_eq!(details.company.label(), "Acme");
        assert_eq!(details.tools, vec![Tool::new("Rust", ToolCertainty::High)]);
        assert_eq!(details.location.unwrap().city.as_deref(), Some("Berlin"));
    }

    #[test]
    fn both_urls_identify_company() {
        let raw = parse(json!({
            "company": {"url": "https://acme.io", "linkedin_url": "https://linkedin.com/company/acme"},
            "title": "SRE"
        }));
        let extraction = raw.validate();
        assert!(extraction.is_complete());
    }

    #[test]
    fn one_url_is_not_enough() {
        let raw = parse(json!({
            "company": {"url": "https://acme.io"},
            "title": "SRE"
        }));
        match raw.validate() {
            Extraction::Incomplete { missing, .. } => {
                assert_eq!(missing, vec![MissingField::CompanyIdentity])
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn blank_values_count_as_missing() {
        let raw = parse(json!({
            "company": null,
            "title": "  ",
            "location": {"country": null, "region": null, "city": null},
            "tools": null
        }));
        match raw.validate() {
            Extraction::Incomplete { details, missing } => {
                assert_eq!(missing, vec![MissingField::Title, MissingField::Company]);
                assert_eq!(details.location, None);
                assert!(details.tools.is_empty());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn null_certainty_keeps_the_tool() {
        let raw = parse(json!({
            "company": {"name": "Acme"},
            "title": "Backend Engineer",
            "tools": [
                {"name": "Rust", "certainty": "High"},
                {"name": "Kafka", "certainty": null},
                {"name": "Redis", "certainty": "Somewhat"},
                {"name": null, "certainty": "High"},
                "Postgres"
            ]
        }));

        let Extraction::Complete(details) = raw.validate() else {
            panic!("expected complete extraction");
        };
        assert_eq!(
            details.tools,
            vec![
                Tool::new("Rust", ToolCertainty::High),
                Tool::new("Kafka", ToolCertainty::Low),
                Tool::new("Redis", ToolCertainty::Low),
            ]
        );
    }

    #[test]
    fn free_text_location_is_absent() {
        let raw = parse(json!({
            "company": {"name": "Acme"},
            "title": "Backend Engineer",
            "location": "Berlin, Germany",
            "tools": "Rust, Kafka"
        }));

        let Extraction::Complete(details) = raw.validate() else {
            panic!("expected complete extraction");
        };
        assert_eq!(details.location, None);
        assert!(details.tools.is_empty());
    }

    #[test]
    fn serialized_status_tag() {
        let extraction = RawJobDetails::default().validate();
        let value = serde_json::to_value(&extraction).unwrap();
        assert_eq!(value["status"], "incomplete");
        assert_eq!(value["missing"], json!(["title", "company"]));
    }
}
