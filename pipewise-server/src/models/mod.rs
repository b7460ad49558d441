//! API records and request bodies
//!
//! Records are what the repositories return and the routes serialize.
//! Request bodies are validated with `validated()` before they reach a
//! repository; invalid input returns ValidationError, not panic.

pub mod company;
pub mod icp;
pub mod job_post;
pub mod opportunity;
pub mod pagination;
pub mod person;
pub mod tag;
pub mod team;
pub mod tenant;
pub mod user;

pub use company::{Company, CompanyCreate, CompanyUpdate};
pub use icp::{Icp, IcpCreate, IcpUpdate};
pub use job_post::{JobPost, JobPostCreate};
pub use opportunity::{
    AuditLogEntry, ContactSummary, JobPostSummary, Opportunity, OpportunityCreate,
    OpportunityDetail, OpportunityFilter, OpportunityUpdate,
};
pub use pagination::{Paginated, Pagination, PaginationParams};
pub use person::{Person, PersonCreate};
pub use tag::{Tag, TagCreate};
pub use team::{Team, TeamCreate, TeamMember, TeamMemberAdd, TeamUpdate};
pub use tenant::{Tenant, TenantCreate, TenantUpdate};
pub use user::{Login, Role, RoleAssignment, Signup, TokenResponse, User, UserCreate, UserUpdate};

pub use pipewise_core::ValidationError;

/// Column widths shared by the request bodies.
pub(crate) mod limits {
    pub const NAME: usize = 255;
    pub const DESCRIPTION: usize = 500;
    pub const URL: usize = 2048;
    pub const TAG_DESCRIPTION: usize = 255;
    pub const PITCH: usize = 500;
}

/// Trim and check an optional URL-ish field.
pub(crate) fn optional_url(
    field: &'static str,
    value: Option<String>,
) -> Result<Option<String>, ValidationError> {
    pipewise_core::validation::optional_text(field, value.as_deref(), limits::URL)
}

/// Validate an optional caller-supplied slug.
pub(crate) fn optional_slug(value: Option<String>) -> Result<Option<String>, ValidationError> {
    value.as_deref().map(pipewise_core::validate_slug).transpose()
}
