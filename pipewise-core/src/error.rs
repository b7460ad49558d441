//! Errors raised while moving values between typed records and their
//! stored column representation.
//!
//! Library code surfaces these as-is; the server wraps them in its
//! database error so a malformed row never reaches a handler half-built.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Stored JSON has a shape the record cannot be built from
    #[error("unexpected shape in {column} column: {reason}")]
    UnexpectedShape { column: &'static str, reason: String },

    /// Stored tag is not one of the enumeration's members
    #[error("unknown {column} value '{value}'")]
    UnknownVariant { column: &'static str, value: String },

    /// Record could not be turned into JSON
    #[error("failed to encode {column} column: {reason}")]
    Encode { column: &'static str, reason: String },
}

impl CodecError {
    pub fn unexpected_shape(column: &'static str, reason: impl Into<String>) -> Self {
        Self::UnexpectedShape {
            column,
            reason: reason.into(),
        }
    }

    pub fn unknown_variant(column: &'static str, value: impl Into<String>) -> Self {
        Self::UnknownVariant {
            column,
            value: value.into(),
        }
    }

    pub fn encode(column: &'static str, reason: impl Into<String>) -> Self {
        Self::Encode {
            column,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = CodecError::unknown_variant("opportunity stage", "won");
        assert_eq!(err.to_string(), "unknown opportunity stage value 'won'");

        let err = CodecError::unexpected_shape("location", "expected object, found array");
        assert!(err.to_string().contains("location column"));
        assert!(err.to_string().contains("found array"));
    }
}
