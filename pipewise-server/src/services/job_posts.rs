use pipewise_core::slugify;
use pipewise_extract::JobDetails;
use sqlx::PgPool;
use uuid::Uuid;

use super::{CompanyService, ServiceResult};
use crate::db::repos::{CompanyRepo, JobPostRepo};
use crate::models::{CompanyCreate, JobPost, JobPostCreate, Paginated, Pagination};

pub struct JobPostService<'a> {
    pool: &'a PgPool,
    companies: CompanyService<'a>,
}

impl<'a> JobPostService<'a> {
    pub fn new(pool: &'a PgPool, logo_dev_token: Option<&'a str>) -> Self {
        Self {
            pool,
            companies: CompanyService::new(pool, logo_dev_token),
        }
    }

    pub async fn create(&self, input: JobPostCreate) -> ServiceResult<JobPost> {
        let input = input.validated()?;
        let mut tx = self.pool.begin().await?;
        if let Some(company_id) = input.company_id {
            CompanyRepo::new(&mut tx).get(company_id).await?;
        }
        let job_post = JobPostRepo::new(&mut tx).insert(&input).await?;
        tx.commit().await?;
        Ok(job_post)
    }

    /// Store an extracted job post, attaching it to the company with the
    /// slug of the extracted company name and creating that company when
    /// none exists yet.
    pub async fn create_from_extraction(
        &self,
        details: JobDetails,
        url: Option<String>,
        body: Option<String>,
    ) -> ServiceResult<JobPost> {
        let label = details.company.label().to_string();
        let input = JobPostCreate {
            title: details.title,
            body,
            url,
            location: details.location,
            tools: details.tools,
            company_id: None,
        }
        .validated()?;

        let mut tx = self.pool.begin().await?;
        let existing = CompanyRepo::new(&mut tx).find_by_slug(&slugify(&label)).await?;
        let company = match existing {
            Some(company) => company,
            None => {
                let create = CompanyCreate {
                    url: details.company.url,
                    linkedin_profile_url: details.company.linkedin_url,
                    ..CompanyCreate::named(label)
                }
                .validated()?;
                self.companies.create_in(&mut tx, create).await?
            }
        };

        let job_post = JobPostRepo::new(&mut tx)
            .insert(&JobPostCreate {
                company_id: Some(company.id),
                ..input
            })
            .await?;
        tx.commit().await?;
        tracing::info!(
            job_post_id = %job_post.id,
            company = %company.slug,
            tools = job_post.tools.len(),
            "stored extracted job post"
        );
        Ok(job_post)
    }

    pub async fn get(&self, id: Uuid) -> ServiceResult<JobPost> {
        let mut tx = self.pool.begin().await?;
        let job_post = JobPostRepo::new(&mut tx).get(id).await?;
        tx.commit().await?;
        Ok(job_post)
    }

    pub async fn list(&self, company_id: Option<Uuid>, page: Pagination) -> ServiceResult<Paginated<JobPost>> {
        let mut tx = self.pool.begin().await?;
        let job_posts = JobPostRepo::new(&mut tx).list(company_id, page).await?;
        tx.commit().await?;
        Ok(job_posts)
    }
}
