//! Tenant identity

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of the tenant a request acts for.
///
/// Tenant-owned repositories take this type rather than a bare `Uuid` so
/// a tenant id cannot be confused with the id of the row being fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(Uuid);

impl TenantId {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl From<Uuid> for TenantId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Visibility of a row or uniqueness domain of a slug: the whole
/// database, or one tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Global,
    Tenant(TenantId),
}

impl Scope {
    pub fn tenant(&self) -> Option<TenantId> {
        match self {
            Self::Global => None,
            Self::Tenant(id) => Some(*id),
        }
    }
}

impl From<TenantId> for Scope {
    fn from(id: TenantId) -> Self {
        Self::Tenant(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_plain_uuid() {
        let id = Uuid::new_v4();
        let json = serde_json::to_value(TenantId::new(id)).unwrap();
        assert_eq!(json, serde_json::Value::String(id.to_string()));
    }

    #[test]
    fn scope_tenant() {
        let id = TenantId::new(Uuid::new_v4());
        assert_eq!(Scope::from(id).tenant(), Some(id));
        assert_eq!(Scope::Global.tenant(), None);
    }
}
