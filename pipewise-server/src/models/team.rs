use chrono::{DateTime, Utc};
use pipewise_core::validation::{optional_text, required_text};
use pipewise_core::TeamRole;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{limits, optional_slug, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Team {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub tenant_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    pub team_id: Uuid,
    pub user_id: Uuid,
    pub role: TeamRole,
    pub is_owner: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TeamCreate {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
}

impl TeamCreate {
    pub fn validated(self) -> Result<Self, ValidationError> {
        Ok(Self {
            name: required_text("name", &self.name, limits::NAME)?,
            description: optional_text("description", self.description.as_deref(), limits::DESCRIPTION)?,
            slug: optional_slug(self.slug)?,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TeamUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub slug: Option<String>,
    pub is_active: Option<bool>,
}

impl TeamUpdate {
    pub fn validated(self) -> Result<Self, ValidationError> {
        Ok(Self {
            name: self
                .name
                .as_deref()
                .map(|n| required_text("name", n, limits::NAME))
                .transpose()?,
            description: optional_text("description", self.description.as_deref(), limits::DESCRIPTION)?,
            slug: optional_slug(self.slug)?,
            is_active: self.is_active,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TeamMemberAdd {
    pub user_id: Uuid,
    #[serde(default)]
    pub role: TeamRole,
    #[serde(default)]
    pub is_owner: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn member_role_defaults_to_member() {
        let body = format!(r#"{{"user_id": "{}"}}"#, Uuid::new_v4());
        let add: TeamMemberAdd = serde_json::from_str(&body).unwrap();
        assert_eq!(add.role, TeamRole::Member);
        assert!(!add.is_owner);
    }

    #[test]
    fn member_role_uses_stored_tags() {
        let body = format!(r#"{{"user_id": "{}", "role": "ADMIN"}}"#, Uuid::new_v4());
        let add: TeamMemberAdd = serde_json::from_str(&body).unwrap();
        assert_eq!(add.role, TeamRole::Admin);
    }
}
