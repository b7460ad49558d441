//! pipewise-core: domain vocabulary shared by the server, the job-post
//! extractor and the CLI.
//!
//! - [`codec`]: typed JSON column adapter over a closed set of value objects
//! - [`enums`]: enumerated text columns
//! - [`criteria`]: ICP criteria blocks and matching
//! - [`slug`]: slug normalization and suffix resolution
//! - [`config`]: layered runtime settings

pub mod codec;
pub mod config;
pub mod criteria;
pub mod enums;
pub mod error;
pub mod slug;
pub mod tenant;
pub mod validation;
pub mod values;

pub use codec::ColumnValue;
pub use config::{ConfigError, LogFormat, Settings};
pub use criteria::{
    CompanyCriteria, CompanyFacts, IcpMatch, IcpProfile, IcpSubject, PersonCriteria,
    ProcessCriteria, ToolCriteria, ToolMatch,
};
pub use enums::{EnumColumn, OpportunityStage, TeamRole, ToolCertainty};
pub use error::CodecError;
pub use slug::{slugify, validate_slug};
pub use tenant::{Scope, TenantId};
pub use validation::ValidationError;
pub use values::{Funding, Location, SocialActivity, Tool, WorkExperience};
