//! Enumerated single-value columns
//!
//! Stored as plain text tags. Decoding a tag outside the enumeration is a
//! [`CodecError::UnknownVariant`], never a silent default.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CodecError;

/// A closed enumeration persisted as a text tag.
pub trait EnumColumn: Sized + Copy + 'static {
    /// Column label used in error messages.
    const COLUMN: &'static str;

    /// Every member, in declaration order.
    const ALL: &'static [Self];

    fn as_tag(&self) -> &'static str;

    fn from_tag(tag: &str) -> Result<Self, CodecError> {
        Self::ALL
            .iter()
            .copied()
            .find(|member| member.as_tag() == tag)
            .ok_or_else(|| CodecError::unknown_variant(Self::COLUMN, tag))
    }
}

macro_rules! enum_column_impls {
    ($ty:ty) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_tag())
            }
        }

        impl FromStr for $ty {
            type Err = CodecError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <$ty as EnumColumn>::from_tag(s)
            }
        }
    };
}

/// Lifecycle stage of an opportunity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpportunityStage {
    #[default]
    Identified,
    Qualified,
    Contacted,
    Engaged,
    Proposed,
    Negotiated,
    Deferred,
    Suspended,
    Customer,
}

impl EnumColumn for OpportunityStage {
    const COLUMN: &'static str = "opportunity stage";
    const ALL: &'static [Self] = &[
        Self::Identified,
        Self::Qualified,
        Self::Contacted,
        Self::Engaged,
        Self::Proposed,
        Self::Negotiated,
        Self::Deferred,
        Self::Suspended,
        Self::Customer,
    ];

    fn as_tag(&self) -> &'static str {
        match self {
            Self::Identified => "identified",
            Self::Qualified => "qualified",
            Self::Contacted => "contacted",
            Self::Engaged => "engaged",
            Self::Proposed => "proposed",
            Self::Negotiated => "negotiated",
            Self::Deferred => "deferred",
            Self::Suspended => "suspended",
            Self::Customer => "customer",
        }
    }
}

enum_column_impls!(OpportunityStage);

/// Role of a user inside a team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TeamRole {
    Admin,
    #[default]
    Member,
}

impl EnumColumn for TeamRole {
    const COLUMN: &'static str = "team role";
    const ALL: &'static [Self] = &[Self::Admin, Self::Member];

    fn as_tag(&self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Member => "MEMBER",
        }
    }
}

enum_column_impls!(TeamRole);

/// How sure the extractor is that a job post mentions a tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ToolCertainty {
    #[default]
    Low,
    Medium,
    High,
}

impl EnumColumn for ToolCertainty {
    const COLUMN: &'static str = "tool certainty";
    const ALL: &'static [Self] = &[Self::Low, Self::Medium, Self::High];

    fn as_tag(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

enum_column_impls!(ToolCertainty);

#[cfg(test)]
mod tests {
    use super::*;

    fn serde_tag<T: Serialize>(value: &T) -> String {
        match serde_json::to_value(value).unwrap() {
            serde_json::Value::String(s) => s,
            other => panic!("expected string, got {other}"),
        }
    }

    #[test]
    fn tags_match_serde_names() {
        for stage in OpportunityStage::ALL {
            assert_eq!(serde_tag(stage), stage.as_tag());
        }
        for role in TeamRole::ALL {
            assert_eq!(serde_tag(role), role.as_tag());
        }
        for certainty in ToolCertainty::ALL {
            assert_eq!(serde_tag(certainty), certainty.as_tag());
        }
    }

    #[test]
    fn from_tag_accepts_every_member() {
        for stage in OpportunityStage::ALL {
            assert_eq!(OpportunityStage::from_tag(stage.as_tag()), Ok(*stage));
        }
        assert_eq!("MEMBER".parse::<TeamRole>(), Ok(TeamRole::Member));
    }

    #[test]
    fn unknown_tag_is_typed_error() {
        let err = OpportunityStage::from_tag("won").unwrap_err();
        assert_eq!(
            err,
            CodecError::UnknownVariant {
                column: "opportunity stage",
                value: "won".into()
            }
        );

        // Tags are case sensitive
        assert!(TeamRole::from_tag("admin").is_err());
    }

    #[test]
    fn default_stage_is_identified() {
        assert_eq!(OpportunityStage::default(), OpportunityStage::Identified);
        assert_eq!(OpportunityStage::Customer.to_string(), "customer");
    }
}
