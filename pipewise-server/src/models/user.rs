//! Users, roles and access requests

use chrono::{DateTime, Utc};
use pipewise_core::validation::{email, optional_text, required_text};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{limits, ValidationError};

pub const MIN_PASSWORD_LEN: usize = 8;
const MAX_PASSWORD_LEN: usize = 128;

/// A user as exposed by the API. The password hash never leaves the
/// repository layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub is_active: bool,
    pub is_superuser: bool,
    pub is_verified: bool,
    pub tenant_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Role {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
}

fn password(value: &str) -> Result<String, ValidationError> {
    if value.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::InvalidFormat {
            field: "password",
            reason: "must be at least 8 characters",
        });
    }
    if value.chars().count() > MAX_PASSWORD_LEN {
        return Err(ValidationError::TooLong {
            field: "password",
            max: MAX_PASSWORD_LEN,
        });
    }
    Ok(value.to_string())
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserCreate {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    pub password: String,
    #[serde(default)]
    pub is_superuser: bool,
}

impl UserCreate {
    pub fn validated(self) -> Result<Self, ValidationError> {
        Ok(Self {
            email: email(&self.email)?,
            name: optional_text("name", self.name.as_deref(), limits::NAME)?,
            password: password(&self.password)?,
            is_superuser: self.is_superuser,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub password: Option<String>,
    pub is_active: Option<bool>,
    pub is_superuser: Option<bool>,
}

impl UserUpdate {
    pub fn validated(self) -> Result<Self, ValidationError> {
        Ok(Self {
            name: optional_text("name", self.name.as_deref(), limits::NAME)?,
            password: self.password.as_deref().map(password).transpose()?,
            is_active: self.is_active,
            is_superuser: self.is_superuser,
        })
    }
}

/// Self-service registration: a new tenant and its first user.
#[derive(Debug, Clone, Deserialize)]
pub struct Signup {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub name: Option<String>,
    pub tenant_name: String,
}

impl Signup {
    pub fn validated(self) -> Result<Self, ValidationError> {
        Ok(Self {
            email: email(&self.email)?,
            password: password(&self.password)?,
            name: optional_text("name", self.name.as_deref(), limits::NAME)?,
            tenant_name: required_text("tenant_name", &self.tenant_name, limits::NAME)?,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Login {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
}

impl TokenResponse {
    pub fn bearer(access_token: String, expires_at: DateTime<Utc>) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
            expires_at,
        }
    }
}

/// Body of role assign/revoke; `user_name` is the user's email.
#[derive(Debug, Clone, Deserialize)]
pub struct RoleAssignment {
    pub user_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_create_normalizes_email() {
        let input = UserCreate {
            email: " Ada@Example.COM".into(),
            name: Some("  ".into()),
            password: "correct horse".into(),
            is_superuser: false,
        }
        .validated()
        .unwrap();
        assert_eq!(input.email, "ada@example.com");
        assert_eq!(input.name, None);
    }

    #[test]
    fn short_password_rejected() {
        let signup = Signup {
            email: "ada@example.com".into(),
            password: "short".into(),
            name: None,
            tenant_name: "Acme".into(),
        };
        assert!(matches!(
            signup.validated(),
            Err(ValidationError::InvalidFormat { field: "password", .. })
        ));
    }

    #[test]
    fn user_serialization_has_no_password() {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: "ada@example.com".into(),
            name: None,
            is_active: true,
            is_superuser: false,
            is_verified: false,
            tenant_id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("hashed_password").is_none());
        assert!(json.get("password").is_none());
    }
}
