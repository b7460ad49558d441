use chrono::{DateTime, Utc};
use pipewise_core::validation::required_text;
use pipewise_core::{Location, Tool};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{limits, optional_url, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPost {
    pub id: Uuid,
    pub title: String,
    pub body: Option<String>,
    pub url: Option<String>,
    pub location: Option<Location>,
    pub tools: Vec<Tool>,
    pub company_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobPostCreate {
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub tools: Vec<Tool>,
    #[serde(default)]
    pub company_id: Option<Uuid>,
}

impl JobPostCreate {
    pub fn validated(self) -> Result<Self, ValidationError> {
        let mut tools: Vec<Tool> = Vec::with_capacity(self.tools.len());
        for tool in self.tools {
            let name = tool.name.trim();
            if name.is_empty() || tools.iter().any(|t| t.name.eq_ignore_ascii_case(name)) {
                continue;
            }
            tools.push(Tool::new(name, tool.certainty));
        }
        Ok(Self {
            title: required_text("title", &self.title, limits::NAME)?,
            body: self.body.filter(|b| !b.trim().is_empty()),
            url: optional_url("url", self.url)?,
            location: self.location.filter(|l| !l.is_empty()),
            tools,
            company_id: self.company_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipewise_core::ToolCertainty;

    #[test]
    fn tools_deduplicated_by_name() {
        let post = JobPostCreate {
            title: "Backend Engineer".into(),
            tools: vec![
                Tool::new("Rust", ToolCertainty::High),
                Tool::new("rust", ToolCertainty::Low),
                Tool::new(" ", ToolCertainty::Low),
                Tool::new("Postgres", ToolCertainty::Medium),
            ],
            ..Default::default()
        }
        .validated()
        .unwrap();
        let names: Vec<_> = post.tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["Rust", "Postgres"]);
        assert_eq!(post.tools[0].certainty, ToolCertainty::High);
    }

    #[test]
    fn title_required() {
        assert!(JobPostCreate::default().validated().is_err());
    }
}
