//! Tenant-scoped query building
//!
//! Every query against a tenant-owned table starts from [`ScopedQuery`],
//! which emits the tenant predicate as the first condition of the WHERE
//! clause. Callers can only narrow the result with further `AND` terms.
//!
//! [`fetch_page`] runs a filtered, paginated list and computes the total
//! from the same predicate.

use pipewise_core::{Scope, TenantId};
use sqlx::postgres::PgRow;
use sqlx::{Encode, FromRow, PgConnection, Postgres, QueryBuilder, Row, Type};

use super::DbError;
use crate::models::{Paginated, Pagination};

/// A SELECT whose WHERE clause always begins with the row scope.
pub struct ScopedQuery<'a> {
    builder: QueryBuilder<'a, Postgres>,
}

impl<'a> ScopedQuery<'a> {
    /// `head` is the query up to and including the FROM clause; `alias` is
    /// the alias (or table name) of the scoped table.
    pub fn new(head: impl Into<String>, alias: &str, scope: Scope) -> Self {
        let mut builder = QueryBuilder::new(head);
        match scope {
            Scope::Tenant(tenant) => {
                builder
                    .push(" WHERE ")
                    .push(alias)
                    .push(".tenant_id = ")
                    .push_bind(tenant.as_uuid());
            }
            Scope::Global => {
                builder.push(" WHERE TRUE");
            }
        }
        Self { builder }
    }

    pub fn tenant(head: impl Into<String>, alias: &str, tenant: TenantId) -> Self {
        Self::new(head, alias, Scope::Tenant(tenant))
    }

    /// `AND <column> = $n`
    pub fn and_eq<T>(&mut self, column: &str, value: T) -> &mut Self
    where
        T: 'a + Encode<'a, Postgres> + Type<Postgres> + Send,
    {
        self.builder
            .push(" AND ")
            .push(column)
            .push(" = ")
            .push_bind(value);
        self
    }

    /// `AND <column> ILIKE '%term%'`
    pub fn and_contains(&mut self, column: &str, term: &str) -> &mut Self {
        let escaped = term
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        self.builder
            .push(" AND ")
            .push(column)
            .push(" ILIKE ")
            .push_bind(format!("%{escaped}%"));
        self
    }

    /// Append raw SQL after the predicate (ORDER BY, LIMIT, ...).
    pub fn tail(&mut self) -> &mut QueryBuilder<'a, Postgres> {
        &mut self.builder
    }

    pub fn sql(&self) -> &str {
        self.builder.sql()
    }

    pub fn into_builder(self) -> QueryBuilder<'a, Postgres> {
        self.builder
    }
}

/// Static parts of a paginated list query.
#[derive(Debug, Clone, Copy)]
pub struct ListQuery<'q> {
    /// Selected columns
    pub columns: &'q str,
    /// FROM clause body, e.g. `opportunity o`
    pub from: &'q str,
    /// Alias of the scoped table
    pub alias: &'q str,
    pub order_by: &'q str,
}

impl ListQuery<'_> {
    fn page_head(&self) -> String {
        format!(
            "SELECT {}, COUNT(*) OVER() AS total_count FROM {}",
            self.columns, self.from
        )
    }

    fn count_head(&self) -> String {
        format!("SELECT COUNT(*) FROM {}", self.from)
    }
}

/// Fetch one page of rows plus the total under the same predicate.
///
/// The total is read from `COUNT(*) OVER()`. A page past the end has no
/// row to carry it, so a separate COUNT with the same filters is issued.
pub async fn fetch_page<R, F>(
    conn: &mut PgConnection,
    query: ListQuery<'_>,
    scope: Scope,
    filters: F,
    page: Pagination,
) -> Result<Paginated<R>, DbError>
where
    R: for<'r> FromRow<'r, PgRow>,
    F: for<'b> Fn(&mut ScopedQuery<'b>),
{
    let mut items = ScopedQuery::new(query.page_head(), query.alias, scope);
    filters(&mut items);
    items
        .tail()
        .push(" ORDER BY ")
        .push(query.order_by)
        .push(" LIMIT ")
        .push_bind(page.limit() as i64)
        .push(" OFFSET ")
        .push_bind(page.offset() as i64);

    let rows = items.into_builder().build().fetch_all(&mut *conn).await?;

    let total = match rows.first() {
        Some(row) => row.try_get::<i64, _>("total_count")?,
        None if page.offset() > 0 => {
            let mut count = ScopedQuery::new(query.count_head(), query.alias, scope);
            filters(&mut count);
            count
                .into_builder()
                .build_query_scalar::<i64>()
                .fetch_one(&mut *conn)
                .await?
        }
        None => 0,
    };

    let items = rows
        .iter()
        .map(|row| R::from_row(row))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Paginated {
        items,
        total,
        page: page.page,
        per_page: page.per_page,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn tenant() -> TenantId {
        TenantId::new(Uuid::new_v4())
    }

    #[test]
    fn tenant_predicate_comes_first() {
        let mut q = ScopedQuery::tenant("SELECT o.id FROM opportunity o", "o", tenant());
        q.and_eq("o.stage", "qualified");
        assert_eq!(
            q.sql(),
            "SELECT o.id FROM opportunity o WHERE o.tenant_id = $1 AND o.stage = $2"
        );
    }

    #[test]
    fn global_scope_has_no_tenant_term() {
        let mut q = ScopedQuery::new("SELECT c.id FROM company c", "c", Scope::Global);
        q.and_contains("c.name", "acme");
        assert_eq!(q.sql(), "SELECT c.id FROM company c WHERE TRUE AND c.name ILIKE $1");
    }

    #[test]
    fn list_and_count_share_the_predicate() {
        let query = ListQuery {
            columns: "o.id",
            from: "opportunity o",
            alias: "o",
            order_by: "o.created_at DESC",
        };
        let t = tenant();
        let filters = |q: &mut ScopedQuery<'_>| {
            q.and_eq("o.stage", "engaged");
        };

        let mut page = ScopedQuery::tenant(query.page_head(), query.alias, t);
        filters(&mut page);
        let mut count = ScopedQuery::tenant(query.count_head(), query.alias, t);
        filters(&mut count);

        let where_of = |sql: &str| sql.split(" WHERE ").nth(1).unwrap().to_string();
        assert_eq!(where_of(page.sql()), where_of(count.sql()));
        assert!(page.sql().contains("COUNT(*) OVER()"));
    }
}
