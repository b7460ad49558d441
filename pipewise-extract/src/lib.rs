//! pipewise-extract: job post extraction through a chat-completions model.
//!
//! The model answer is parsed into [`RawJobDetails`] and validated into an
//! [`Extraction`]: either complete details or the raw answer plus the list
//! of fields that could not be read.

pub mod client;
pub mod details;
pub mod error;
pub mod prompt;

pub use client::{parse_completion, JobPostExtractor};
pub use details::{CompanyRef, Extraction, JobDetails, MissingField, RawCompany, RawJobDetails};
pub use error::ExtractError;
