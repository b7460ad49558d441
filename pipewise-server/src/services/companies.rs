use std::borrow::Cow;

use async_trait::async_trait;
use pipewise_core::Scope;
use sqlx::{PgConnection, PgPool};
use url::Url;
use uuid::Uuid;

use super::{insert_with_unique_slug, slug_for_update, ServiceResult, SlugInsert};
use crate::db::repos::CompanyRepo;
use crate::db::slugs::SlugTable;
use crate::db::DbError;
use crate::models::{Company, CompanyCreate, CompanyUpdate, Paginated, Pagination};

const LOGO_DEV_BASE: &str = "https://img.logo.dev";

/// logo.dev image url for the host of `website`.
///
/// Returns `None` (and logs a warning) when `website` has no host.
pub fn logo_dev_url(website: &str, token: &str) -> Option<String> {
    let host = Url::parse(website).ok().and_then(|url| {
        url.host_str().map(|host| match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        })
    });
    match host {
        Some(host) => Some(format!("{LOGO_DEV_BASE}/{host}?token={token}")),
        None => {
            tracing::warn!(url = website, "failed to build logo.dev link");
            None
        }
    }
}

/// Fill in a logo when the company has a website but no picture.
fn with_logo(mut input: CompanyCreate, token: Option<&str>) -> CompanyCreate {
    if input.profile_pic_url.is_none() {
        if let (Some(url), Some(token)) = (input.url.as_deref(), token) {
            input.profile_pic_url = logo_dev_url(url, token);
        }
    }
    input
}

#[async_trait]
impl SlugInsert for CompanyCreate {
    type Output = Company;

    const TABLE: SlugTable = SlugTable::Company;

    fn slug_source(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.name)
    }

    fn requested_slug(&self) -> Option<&str> {
        self.slug.as_deref()
    }

    async fn insert(&self, conn: &mut PgConnection, slug: &str) -> Result<Company, DbError> {
        CompanyRepo::new(conn).insert(self, slug).await
    }
}

pub struct CompanyService<'a> {
    pool: &'a PgPool,
    logo_dev_token: Option<&'a str>,
}

impl<'a> CompanyService<'a> {
    pub fn new(pool: &'a PgPool, logo_dev_token: Option<&'a str>) -> Self {
        Self {
            pool,
            logo_dev_token,
        }
    }

    /// Create on an open transaction.
    pub(crate) async fn create_in(&self, conn: &mut PgConnection, input: CompanyCreate) -> Result<Company, DbError> {
        let input = with_logo(input, self.logo_dev_token);
        let company = insert_with_unique_slug(conn, Scope::Global, &input).await?;
        tracing::info!(company_id = %company.id, slug = %company.slug, "created company");
        Ok(company)
    }

    pub async fn create(&self, input: CompanyCreate) -> ServiceResult<Company> {
        let input = input.validated()?;
        let mut tx = self.pool.begin().await?;
        let company = self.create_in(&mut tx, input).await?;
        tx.commit().await?;
        Ok(company)
    }

    pub async fn get(&self, id: Uuid) -> ServiceResult<Company> {
        let mut tx = self.pool.begin().await?;
        let company = CompanyRepo::new(&mut tx).get(id).await?;
        tx.commit().await?;
        Ok(company)
    }

    pub async fn list(&self, search: Option<&str>, page: Pagination) -> ServiceResult<Paginated<Company>> {
        let mut tx = self.pool.begin().await?;
        let companies = CompanyRepo::new(&mut tx).list(search, page).await?;
        tx.commit().await?;
        Ok(companies)
    }

    pub async fn update(&self, id: Uuid, changes: CompanyUpdate) -> ServiceResult<Company> {
        let changes = changes.validated()?;
        let mut tx = self.pool.begin().await?;
        let mut company = CompanyRepo::new(&mut tx).get(id).await?;
        let slug = slug_for_update(
            &mut tx,
            SlugTable::Company,
            Scope::Global,
            id,
            &company.name,
            changes.name.as_deref(),
            changes.slug.as_deref(),
        )
        .await?;

        if let Some(slug) = slug {
            company.slug = slug;
        }
        macro_rules! apply {
            ($($field:ident),*) => {
                $(if let Some(value) = changes.$field {
                    company.$field = Some(value);
                })*
            };
        }
        if let Some(name) = changes.name {
            company.name = name;
        }
        apply!(
            description,
            company_type,
            industry,
            headcount,
            founded_year,
            url,
            profile_pic_url,
            linkedin_profile_url,
            hq_location,
            last_funding
        );

        let company = CompanyRepo::new(&mut tx).save(&company).await?;
        tx.commit().await?;
        Ok(company)
    }
}
