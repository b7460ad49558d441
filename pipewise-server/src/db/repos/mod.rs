//! Repository implementations for database access
//!
//! Each repository borrows a connection (usually the service's open
//! transaction) and follows these patterns:
//! - Tenant-owned tables take a [`TenantId`](pipewise_core::TenantId) on
//!   every method and filter on it
//! - Lists return the page and the total from one predicate
//! - Uniqueness and references are left to the constraints; violations
//!   surface as [`DbError::Conflict`](super::DbError::Conflict) and
//!   [`DbError::ForeignKey`](super::DbError::ForeignKey)
//! - JSON and enum columns are decoded through `pipewise_core::codec`

pub mod audit_logs;
pub mod companies;
pub mod icps;
pub mod job_posts;
pub mod opportunities;
pub mod people;
pub mod roles;
pub mod sessions;
pub mod tags;
pub mod teams;
pub mod tenants;
pub mod users;

pub use audit_logs::{AuditLogRepo, NewAuditLog};
pub use companies::CompanyRepo;
pub use icps::IcpRepo;
pub use job_posts::JobPostRepo;
pub use opportunities::OpportunityRepo;
pub use people::PersonRepo;
pub use roles::RoleRepo;
pub use sessions::SessionRepo;
pub use tags::TagRepo;
pub use teams::TeamRepo;
pub use tenants::TenantRepo;
pub use users::{UserCredentials, UserRepo};

use uuid::Uuid;

use super::DbError;

/// First id of `wanted` missing from `found`, as a NotFound error.
pub(crate) fn ensure_all_found(
    resource: &'static str,
    wanted: &[Uuid],
    found: &[Uuid],
) -> Result<(), DbError> {
    match wanted.iter().find(|id| !found.contains(id)) {
        Some(missing) => Err(DbError::not_found(resource, missing)),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_first_missing_id() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert!(ensure_all_found("person", &[a], &[a, b]).is_ok());
        let err = ensure_all_found("person", &[a, b], &[a]).unwrap_err();
        assert_eq!(err.to_string(), format!("not found: person '{b}'"));
    }
}
