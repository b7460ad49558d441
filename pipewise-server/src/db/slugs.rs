//! Slug lookups against the database
//!
//! Uniqueness scope per table (matches the unique constraints in the
//! migrations): tenant, team, role, tag, company and person slugs are
//! global; opportunity slugs are unique per tenant.

use pipewise_core::slug::{first_available, slugify};
use pipewise_core::Scope;
use sqlx::{PgConnection, Postgres, QueryBuilder};
use uuid::Uuid;

use super::DbError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlugTable {
    Tenant,
    Team,
    Role,
    Tag,
    Company,
    Person,
    Opportunity,
}

impl SlugTable {
    pub fn table(&self) -> &'static str {
        match self {
            Self::Tenant => "tenant",
            Self::Team => "team",
            Self::Role => "role",
            Self::Tag => "tag",
            Self::Company => "company",
            Self::Person => "person",
            Self::Opportunity => "opportunity",
        }
    }

    /// Name of the unique constraint guarding the slug column.
    pub fn constraint(&self) -> &'static str {
        match self {
            Self::Tenant => "uq_tenant_slug",
            Self::Team => "uq_team_slug",
            Self::Role => "uq_role_slug",
            Self::Tag => "uq_tag_slug",
            Self::Company => "uq_company_slug",
            Self::Person => "uq_person_slug",
            Self::Opportunity => "uq_opportunity_tenant_slug",
        }
    }

    pub fn is_tenant_scoped(&self) -> bool {
        matches!(self, Self::Opportunity)
    }

    /// Scope a slug of this table is unique in, given the acting tenant.
    pub fn scope_for(&self, tenant: Option<pipewise_core::TenantId>) -> Scope {
        match tenant {
            Some(t) if self.is_tenant_scoped() => Scope::Tenant(t),
            _ => Scope::Global,
        }
    }
}

fn taken_query<'a>(
    table: SlugTable,
    base: &str,
    scope: Scope,
    exclude: Option<Uuid>,
) -> QueryBuilder<'a, Postgres> {
    let mut qb = QueryBuilder::new("SELECT slug FROM ");
    qb.push(table.table())
        .push(" WHERE (slug = ")
        .push_bind(base.to_string())
        .push(" OR slug LIKE ")
        .push_bind(format!("{base}-%"))
        .push(")");
    if let Scope::Tenant(tenant) = scope {
        qb.push(" AND tenant_id = ").push_bind(tenant.as_uuid());
    }
    if let Some(id) = exclude {
        qb.push(" AND id <> ").push_bind(id);
    }
    qb
}

/// Slugs already used in `scope` that could collide with `base`.
pub async fn taken_slugs(
    conn: &mut PgConnection,
    table: SlugTable,
    base: &str,
    scope: Scope,
    exclude: Option<Uuid>,
) -> Result<Vec<String>, DbError> {
    let slugs = taken_query(table, base, scope, exclude)
        .build_query_scalar::<String>()
        .fetch_all(&mut *conn)
        .await?;
    Ok(slugs)
}

/// First free slug for `name` in `scope`, ignoring the row `exclude`.
pub async fn available_slug(
    conn: &mut PgConnection,
    table: SlugTable,
    name: &str,
    scope: Scope,
    exclude: Option<Uuid>,
) -> Result<String, DbError> {
    let base = slugify(name);
    let taken = taken_slugs(conn, table, &base, scope, exclude).await?;
    let slug = first_available(&base, taken.iter().map(String::as_str));
    tracing::debug!(table = table.table(), %slug, taken = taken.len(), "resolved slug");
    Ok(slug)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipewise_core::TenantId;

    #[test]
    fn global_lookup_has_no_tenant_term() {
        let qb = taken_query(SlugTable::Tenant, "acme-inc", Scope::Global, None);
        assert_eq!(
            qb.sql(),
            "SELECT slug FROM tenant WHERE (slug = $1 OR slug LIKE $2)"
        );
    }

    #[test]
    fn tenant_lookup_filters_tenant_and_self() {
        let tenant = TenantId::new(Uuid::new_v4());
        let qb = taken_query(
            SlugTable::Opportunity,
            "acme",
            Scope::Tenant(tenant),
            Some(Uuid::new_v4()),
        );
        assert_eq!(
            qb.sql(),
            "SELECT slug FROM opportunity WHERE (slug = $1 OR slug LIKE $2) AND tenant_id = $3 AND id <> $4"
        );
    }

    #[test]
    fn only_opportunities_are_tenant_scoped() {
        let tenant = TenantId::new(Uuid::new_v4());
        assert_eq!(SlugTable::Tenant.scope_for(Some(tenant)), Scope::Global);
        assert_eq!(SlugTable::Company.scope_for(Some(tenant)), Scope::Global);
        assert_eq!(
            SlugTable::Opportunity.scope_for(Some(tenant)),
            Scope::Tenant(tenant)
        );
    }
}
