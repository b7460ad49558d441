use chrono::{DateTime, Utc};
use pipewise_core::validation::{email, optional_text};
use pipewise_core::{Location, SocialActivity, WorkExperience};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{limits, optional_slug, optional_url, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: Uuid,
    pub slug: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub full_name: Option<String>,
    pub headline: Option<String>,
    pub title: Option<String>,
    pub summary: Option<String>,
    pub url: Option<String>,
    pub linkedin_profile_url: Option<String>,
    pub work_email: Option<String>,
    pub location: Option<Location>,
    pub work_experiences: Vec<WorkExperience>,
    pub social_activities: Vec<SocialActivity>,
    pub skills: Vec<String>,
    pub company_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PersonCreate {
    pub slug: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub full_name: Option<String>,
    pub headline: Option<String>,
    pub title: Option<String>,
    pub summary: Option<String>,
    pub url: Option<String>,
    pub linkedin_profile_url: Option<String>,
    pub work_email: Option<String>,
    pub location: Option<Location>,
    pub work_experiences: Vec<WorkExperience>,
    pub social_activities: Vec<SocialActivity>,
    pub skills: Vec<String>,
    pub company_id: Option<Uuid>,
}

impl PersonCreate {
    /// Name the slug is derived from: the full name, else first and last
    /// name joined.
    pub fn display_name(&self) -> Option<String> {
        if let Some(full) = self.full_name.as_deref() {
            return Some(full.to_string());
        }
        let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .collect();
        (!parts.is_empty()).then(|| parts.join(" "))
    }

    pub fn validated(self) -> Result<Self, ValidationError> {
        let text = |field: &'static str, value: Option<String>| {
            optional_text(field, value.as_deref(), limits::NAME)
        };
        let validated = Self {
            slug: optional_slug(self.slug)?,
            first_name: text("first_name", self.first_name)?,
            last_name: text("last_name", self.last_name)?,
            full_name: text("full_name", self.full_name)?,
            headline: optional_text("headline", self.headline.as_deref(), limits::DESCRIPTION)?,
            title: text("title", self.title)?,
            summary: self.summary.filter(|s| !s.trim().is_empty()),
            url: optional_url("url", self.url)?,
            linkedin_profile_url: optional_url("linkedin_profile_url", self.linkedin_profile_url)?,
            work_email: match self.work_email.as_deref().map(str::trim) {
                None | Some("") => None,
                Some(addr) => Some(email(addr)?),
            },
            location: self.location.filter(|l| !l.is_empty()),
            work_experiences: self.work_experiences,
            social_activities: self.social_activities,
            skills: self
                .skills
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            company_id: self.company_id,
        };
        if validated.display_name().is_none() && validated.slug.is_none() {
            return Err(ValidationError::Empty { field: "full_name" });
        }
        Ok(validated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_falls_back_to_parts() {
        let person = PersonCreate {
            first_name: Some("Ada".into()),
            last_name: Some("Lovelace".into()),
            ..Default::default()
        };
        assert_eq!(person.display_name().as_deref(), Some("Ada Lovelace"));
    }

    #[test]
    fn nameless_person_rejected() {
        assert_eq!(
            PersonCreate::default().validated().unwrap_err(),
            ValidationError::Empty { field: "full_name" }
        );
    }

    #[test]
    fn blank_skills_removed() {
        let person = PersonCreate {
            full_name: Some("Ada".into()),
            skills: vec![" rust ".into(), "".into()],
            ..Default::default()
        }
        .validated()
        .unwrap();
        assert_eq!(person.skills, vec!["rust".to_string()]);
    }
}
