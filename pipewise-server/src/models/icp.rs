use chrono::{DateTime, Utc};
use pipewise_core::validation::{optional_text, required_text};
use pipewise_core::{CompanyCriteria, IcpProfile, PersonCriteria, ProcessCriteria, ToolCriteria};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{limits, ValidationError};

/// Ideal customer profile of a tenant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Icp {
    pub id: Uuid,
    pub name: String,
    pub company: Option<CompanyCriteria>,
    pub tool: Option<ToolCriteria>,
    pub process: Option<ProcessCriteria>,
    pub person: Option<PersonCriteria>,
    pub pitch: Option<String>,
    pub tenant_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Icp {
    pub fn profile(&self) -> IcpProfile {
        IcpProfile {
            company: self.company.clone(),
            tool: self.tool.clone(),
            process: self.process.clone(),
            person: self.person.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IcpCreate {
    pub name: String,
    #[serde(default)]
    pub company: Option<CompanyCriteria>,
    #[serde(default)]
    pub tool: Option<ToolCriteria>,
    #[serde(default)]
    pub process: Option<ProcessCriteria>,
    #[serde(default)]
    pub person: Option<PersonCriteria>,
    #[serde(default)]
    pub pitch: Option<String>,
}

impl IcpCreate {
    pub fn validated(self) -> Result<Self, ValidationError> {
        Ok(Self {
            name: required_text("name", &self.name, limits::NAME)?,
            pitch: optional_text("pitch", self.pitch.as_deref(), limits::PITCH)?,
            ..self
        })
    }
}

/// Partial update; blocks left out keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IcpUpdate {
    pub name: Option<String>,
    pub company: Option<CompanyCriteria>,
    pub tool: Option<ToolCriteria>,
    pub process: Option<ProcessCriteria>,
    pub person: Option<PersonCriteria>,
    pub pitch: Option<String>,
}

impl IcpUpdate {
    pub fn validated(self) -> Result<Self, ValidationError> {
        Ok(Self {
            name: self
                .name
                .as_deref()
                .map(|n| required_text("name", n, limits::NAME))
                .transpose()?,
            pitch: optional_text("pitch", self.pitch.as_deref(), limits::PITCH)?,
            ..self
        })
    }

    /// Apply onto a stored ICP.
    pub fn apply(self, icp: &mut Icp) {
        if let Some(name) = self.name {
            icp.name = name;
        }
        if self.company.is_some() {
            icp.company = self.company;
        }
        if self.tool.is_some() {
            icp.tool = self.tool;
        }
        if self.process.is_some() {
            icp.process = self.process;
        }
        if self.person.is_some() {
            icp.person = self.person;
        }
        if self.pitch.is_some() {
            icp.pitch = self.pitch;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored() -> Icp {
        let now = Utc::now();
        Icp {
            id: Uuid::new_v4(),
            name: "Mid-market SaaS".into(),
            company: Some(CompanyCriteria {
                countries: vec!["DE".into()],
                ..Default::default()
            }),
            tool: None,
            process: None,
            person: None,
            pitch: Some("We help".into()),
            tenant_id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn pitch_limited_to_500() {
        let create = IcpCreate {
            name: "x".into(),
            pitch: Some("p".repeat(501)),
            ..Default::default()
        };
        assert!(matches!(
            create.validated(),
            Err(ValidationError::TooLong { field: "pitch", max: 500 })
        ));
    }

    #[test]
    fn partial_update_keeps_other_blocks() {
        let mut icp = stored();
        IcpUpdate {
            tool: Some(ToolCriteria {
                include: vec!["Rust".into()],
                exclude: vec![],
            }),
            ..Default::default()
        }
        .apply(&mut icp);
        assert!(icp.company.is_some());
        assert!(icp.tool.is_some());
        assert_eq!(icp.pitch.as_deref(), Some("We help"));
    }
}
