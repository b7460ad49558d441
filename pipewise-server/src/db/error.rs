//! Database error type
//!
//! Unique violations are classified into [`DbError::Conflict`] and
//! foreign-key violations into [`DbError::ForeignKey`] at the `?` boundary,
//! so callers can tell a taken slug from a broken connection without
//! inspecting driver errors.

use pipewise_core::CodecError;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[source] sqlx::Error),

    #[error("not found: {resource} '{id}'")]
    NotFound { resource: &'static str, id: String },

    #[error("conflict on {constraint}")]
    Conflict { constraint: String },

    /// Referenced row missing on write, or still referenced on delete.
    #[error("foreign key {constraint} violated")]
    ForeignKey { constraint: String },

    #[error("stored value could not be decoded: {0}")]
    Decode(#[from] CodecError),

    #[error("migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

impl DbError {
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    /// True when the error is a violation of `constraint`.
    pub fn is_conflict_on(&self, constraint: &str) -> bool {
        matches!(self, Self::Conflict { constraint: c } if c == constraint)
    }

    /// On a write whose references were checked first, a foreign-key
    /// violation means a referenced row went away since: report it as
    /// not found.
    pub fn missing_reference(self) -> Self {
        match self {
            Self::ForeignKey { constraint } => Self::NotFound {
                resource: "referenced row",
                id: constraint,
            },
            other => other,
        }
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            let constraint = || db.constraint().unwrap_or("unknown").to_string();
            if db.is_unique_violation() {
                return Self::Conflict {
                    constraint: constraint(),
                };
            }
            if db.is_foreign_key_violation() {
                return Self::ForeignKey {
                    constraint: constraint(),
                };
            }
        }
        Self::Sqlx(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_not_found_stays_sqlx() {
        let err = DbError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, DbError::Sqlx(_)));
    }

    #[test]
    fn conflict_matching() {
        let err = DbError::Conflict {
            constraint: "uq_tenant_slug".into(),
        };
        assert!(err.is_conflict_on("uq_tenant_slug"));
        assert!(!err.is_conflict_on("uq_team_slug"));
        assert_eq!(err.to_string(), "conflict on uq_tenant_slug");
    }

    #[test]
    fn dangling_reference_becomes_not_found() {
        let err = DbError::ForeignKey {
            constraint: "opportunity_company_id_fkey".into(),
        }
        .missing_reference();
        assert!(matches!(
            &err,
            DbError::NotFound { resource: "referenced row", id } if id == "opportunity_company_id_fkey"
        ));

        let err = DbError::Conflict {
            constraint: "uq_tag_slug".into(),
        }
        .missing_reference();
        assert!(err.is_conflict_on("uq_tag_slug"));
    }

    #[test]
    fn not_found_display() {
        let err = DbError::not_found("opportunity", "abc");
        assert_eq!(err.to_string(), "not found: opportunity 'abc'");
    }
}
