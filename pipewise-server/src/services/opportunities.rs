//! Opportunities: tenant-owned, audited, linked to contacts and job posts

use std::borrow::Cow;

use async_trait::async_trait;
use pipewise_core::{IcpMatch, IcpSubject, TenantId};
use serde_json::{json, Map, Value};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::{insert_with_unique_slug, slug_for_update, Actor, ServiceResult, SlugInsert};
use crate::db::repos::{
    ensure_all_found, AuditLogRepo, CompanyRepo, IcpRepo, JobPostRepo, NewAuditLog, OpportunityRepo,
    PersonRepo, UserRepo,
};
use crate::db::slugs::SlugTable;
use crate::db::DbError;
use crate::models::{
    Company, Icp, Opportunity, OpportunityCreate, OpportunityDetail, OpportunityFilter,
    OpportunityUpdate, Paginated, Pagination,
};

/// Columns recorded in the audit diff.
const AUDITED_FIELDS: [&str; 6] = ["name", "slug", "stage", "notes", "owner_id", "company_id"];

struct NewOpportunity<'a> {
    tenant: TenantId,
    input: &'a OpportunityCreate,
}

#[async_trait]
impl SlugInsert for NewOpportunity<'_> {
    type Output = Opportunity;

    const TABLE: SlugTable = SlugTable::Opportunity;

    fn slug_source(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.input.name)
    }

    fn requested_slug(&self) -> Option<&str> {
        self.input.slug.as_deref()
    }

    async fn insert(&self, conn: &mut PgConnection, slug: &str) -> Result<Opportunity, DbError> {
        OpportunityRepo::new(conn).insert(self.tenant, self.input, slug).await
    }
}

/// Audited fields of `opportunity` as a JSON object.
fn snapshot(opportunity: &Opportunity) -> Map<String, Value> {
    let Ok(Value::Object(all)) = serde_json::to_value(opportunity) else {
        return Map::new();
    };
    all.into_iter()
        .filter(|(key, _)| AUDITED_FIELDS.contains(&key.as_str()))
        .collect()
}

/// `{field: {"old": .., "new": ..}}` for every audited field that differs.
fn field_changes(before: &Opportunity, after: &Opportunity) -> Map<String, Value> {
    let old = snapshot(before);
    snapshot(after)
        .into_iter()
        .filter_map(|(key, new)| {
            let previous = old.get(&key).cloned().unwrap_or(Value::Null);
            (previous != new).then(|| (key, json!({ "old": previous, "new": new })))
        })
        .collect()
}

fn link_change(changes: &mut Map<String, Value>, key: &str, old: Vec<Uuid>, new: &[Uuid]) {
    let mut sorted_old = old.clone();
    let mut sorted_new = new.to_vec();
    sorted_old.sort();
    sorted_new.sort();
    if sorted_old != sorted_new {
        changes.insert(key.to_string(), json!({ "old": old, "new": new }));
    }
}

/// Evaluate the tenant ICP against an opportunity's company, job posts
/// and contacts.
fn icp_match(icp: &Icp, company: Option<&Company>, detail: &OpportunityDetail) -> IcpMatch {
    let subject = IcpSubject {
        company: company.map(Company::facts),
        tools: detail.job_posts.iter().flat_map(|j| j.tools.iter()).collect(),
        texts: detail
            .job_posts
            .iter()
            .flat_map(|j| std::iter::once(j.title.as_str()).chain(j.body.as_deref()))
            .collect(),
        contacts: detail
            .contacts
            .iter()
            .map(|c| (c.id, c.title.as_deref()))
            .collect(),
    };
    icp.profile().evaluate(&subject)
}

pub struct OpportunityService<'a> {
    pool: &'a PgPool,
}

impl<'a> OpportunityService<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Owner, company and linked rows must be visible to `tenant`.
    async fn check_references(
        conn: &mut PgConnection,
        tenant: TenantId,
        owner_id: Option<Uuid>,
        company_id: Option<Uuid>,
        contact_ids: Option<&[Uuid]>,
        job_post_ids: Option<&[Uuid]>,
    ) -> Result<(), DbError> {
        if let Some(owner) = owner_id {
            UserRepo::new(&mut *conn).get(tenant, owner).await?;
        }
        if let Some(company) = company_id {
            CompanyRepo::new(&mut *conn).get(company).await?;
        }
        if let Some(ids) = contact_ids.filter(|ids| !ids.is_empty()) {
            let found = PersonRepo::new(&mut *conn).existing(ids).await?;
            ensure_all_found("person", ids, &found)?;
        }
        if let Some(ids) = job_post_ids.filter(|ids| !ids.is_empty()) {
            let found = JobPostRepo::new(&mut *conn).existing(ids).await?;
            ensure_all_found("job post", ids, &found)?;
        }
        Ok(())
    }

    pub async fn create(&self, actor: Actor, input: OpportunityCreate) -> ServiceResult<OpportunityDetail> {
        let input = input.validated()?;
        let tenant = actor.tenant;
        let mut tx = self.pool.begin().await?;
        Self::check_references(
            &mut tx,
            tenant,
            input.owner_id,
            input.company_id,
            Some(input.contact_ids.as_slice()),
            Some(input.job_post_ids.as_slice()),
        )
        .await?;

        let scope = SlugTable::Opportunity.scope_for(Some(tenant));
        let opportunity = insert_with_unique_slug(&mut tx, scope, &NewOpportunity { tenant, input: &input })
            .await
            .map_err(DbError::missing_reference)?;

        let mut repo = OpportunityRepo::new(&mut tx);
        repo.set_contacts(opportunity.id, &input.contact_ids)
            .await
            .map_err(DbError::missing_reference)?;
        repo.set_job_posts(opportunity.id, &input.job_post_ids)
            .await
            .map_err(DbError::missing_reference)?;

        let mut diff = snapshot(&opportunity);
        diff.insert("contact_ids".into(), json!(input.contact_ids));
        diff.insert("job_post_ids".into(), json!(input.job_post_ids));
        AuditLogRepo::new(&mut tx)
            .append(
                tenant,
                NewAuditLog {
                    opportunity_id: opportunity.id,
                    user_id: actor.user_id,
                    operation: "create",
                    diff: Value::Object(diff),
                },
            )
            .await?;

        let detail = self.detail_in(&mut tx, tenant, opportunity.id).await?;
        tx.commit().await?;
        tracing::info!(opportunity_id = %opportunity.id, tenant_id = %tenant, "created opportunity");
        Ok(detail)
    }

    async fn detail_in(
        &self,
        conn: &mut PgConnection,
        tenant: TenantId,
        id: Uuid,
    ) -> Result<OpportunityDetail, DbError> {
        let mut detail = OpportunityRepo::new(&mut *conn).detail(tenant, id).await?;
        if let Some(icp) = IcpRepo::new(&mut *conn).first(tenant).await? {
            let company = match detail.opportunity.company_id {
                Some(company_id) => Some(CompanyRepo::new(&mut *conn).get(company_id).await?),
                None => None,
            };
            detail.icp_match = Some(icp_match(&icp, company.as_ref(), &detail));
        }
        Ok(detail)
    }

    /// Detail view, with the ICP match when the tenant has an ICP.
    pub async fn get(&self, tenant: TenantId, id: Uuid) -> ServiceResult<OpportunityDetail> {
        let mut tx = self.pool.begin().await?;
        let detail = self.detail_in(&mut tx, tenant, id).await?;
        tx.commit().await?;
        Ok(detail)
    }

    pub async fn list(
        &self,
        tenant: TenantId,
        filter: OpportunityFilter,
        page: Pagination,
    ) -> ServiceResult<Paginated<Opportunity>> {
        let filter = filter.validated()?;
        let mut tx = self.pool.begin().await?;
        let opportunities = OpportunityRepo::new(&mut tx).list(tenant, &filter, page).await?;
        tx.commit().await?;
        Ok(opportunities)
    }

    pub async fn update(
        &self,
        actor: Actor,
        id: Uuid,
        changes: OpportunityUpdate,
    ) -> ServiceResult<OpportunityDetail> {
        let changes = changes.validated()?;
        let tenant = actor.tenant;
        let mut tx = self.pool.begin().await?;
        let current = OpportunityRepo::new(&mut tx).detail(tenant, id).await?;
        Self::check_references(
            &mut tx,
            tenant,
            changes.owner_id.flatten(),
            changes.company_id.flatten(),
            changes.contact_ids.as_deref(),
            changes.job_post_ids.as_deref(),
        )
        .await?;

        let before = current.opportunity;
        let slug = slug_for_update(
            &mut tx,
            SlugTable::Opportunity,
            SlugTable::Opportunity.scope_for(Some(tenant)),
            id,
            &before.name,
            changes.name.as_deref(),
            changes.slug.as_deref(),
        )
        .await?;

        let mut next = before.clone();
        if let Some(slug) = slug {
            next.slug = slug;
        }
        if let Some(name) = changes.name {
            next.name = name;
        }
        if let Some(stage) = changes.stage {
            next.stage = stage;
        }
        if let Some(notes) = changes.notes {
            next.notes = notes;
        }
        if let Some(owner_id) = changes.owner_id {
            next.owner_id = owner_id;
        }
        if let Some(company_id) = changes.company_id {
            next.company_id = company_id;
        }

        let saved = OpportunityRepo::new(&mut tx)
            .save(&next)
            .await
            .map_err(DbError::missing_reference)?;
        let mut diff = field_changes(&before, &saved);

        if let Some(contact_ids) = changes.contact_ids.as_deref() {
            OpportunityRepo::new(&mut tx)
                .set_contacts(id, contact_ids)
                .await
                .map_err(DbError::missing_reference)?;
            let old = current.contacts.iter().map(|c| c.id).collect();
            link_change(&mut diff, "contact_ids", old, contact_ids);
        }
        if let Some(job_post_ids) = changes.job_post_ids.as_deref() {
            OpportunityRepo::new(&mut tx)
                .set_job_posts(id, job_post_ids)
                .await
                .map_err(DbError::missing_reference)?;
            let old = current.job_posts.iter().map(|j| j.id).collect();
            link_change(&mut diff, "job_post_ids", old, job_post_ids);
        }

        AuditLogRepo::new(&mut tx)
            .append(
                tenant,
                NewAuditLog {
                    opportunity_id: id,
                    user_id: actor.user_id,
                    operation: "update",
                    diff: Value::Object(diff),
                },
            )
            .await?;

        let detail = self.detail_in(&mut tx, tenant, id).await?;
        tx.commit().await?;
        Ok(detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pipewise_core::{OpportunityStage, ToolCriteria, ToolCertainty, Tool};

    use crate::models::{ContactSummary, JobPostSummary};

    fn opportunity() -> Opportunity {
        let now = Utc::now();
        Opportunity {
            id: Uuid::new_v4(),
            slug: "acme".into(),
            name: "Acme".into(),
            stage: OpportunityStage::Identified,
            notes: None,
            owner_id: None,
            company_id: None,
            tenant_id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn diff_lists_only_changed_fields() {
        let before = opportunity();
        let mut after = before.clone();
        after.notes = Some("call back".into());
        after.updated_at = Utc::now();

        let diff = field_changes(&before, &after);
        assert_eq!(diff.len(), 1);
        assert_eq!(diff["notes"], json!({"old": null, "new": "call back"}));
    }

    #[test]
    fn snapshot_skips_bookkeeping_columns() {
        let snap = snapshot(&opportunity());
        assert!(snap.contains_key("stage"));
        assert!(!snap.contains_key("id"));
        assert!(!snap.contains_key("updated_at"));
    }

    #[test]
    fn reordered_links_are_not_a_change() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut diff = Map::new();
        link_change(&mut diff, "contact_ids", vec![a, b], &[b, a]);
        assert!(diff.is_empty());

        link_change(&mut diff, "contact_ids", vec![a, b], &[a]);
        assert_eq!(diff["contact_ids"]["new"], json!([a]));
    }

    #[test]
    fn icp_match_reads_job_post_tools_and_contact_titles() {
        let now = Utc::now();
        let icp = Icp {
            id: Uuid::new_v4(),
            name: "Platform teams".into(),
            company: None,
            tool: Some(ToolCriteria {
                include: vec!["rust".into()],
                exclude: vec![],
            }),
            process: None,
            person: Some(pipewise_core::PersonCriteria {
                titles: vec!["engineer".into()],
                ..Default::default()
            }),
            pitch: None,
            tenant_id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
        };
        let engineer = Uuid::new_v4();
        let detail = OpportunityDetail {
            opportunity: opportunity(),
            contacts: vec![
                ContactSummary {
                    id: engineer,
                    slug: "ada".into(),
                    full_name: Some("Ada".into()),
                    title: Some("Staff Engineer".into()),
                    linkedin_profile_url: None,
                    location: None,
                },
                ContactSummary {
                    id: Uuid::new_v4(),
                    slug: "bob".into(),
                    full_name: Some("Bob".into()),
                    title: Some("Recruiter".into()),
                    linkedin_profile_url: None,
                    location: None,
                },
            ],
            job_posts: vec![JobPostSummary {
                id: Uuid::new_v4(),
                title: "Backend".into(),
                url: None,
                body: None,
                location: None,
                tools: vec![Tool::new("Rust", ToolCertainty::High)],
                company_id: None,
            }],
            logs: vec![],
            icp_match: None,
        };

        let result = icp_match(&icp, None, &detail);
        assert_eq!(result.company, None);
        assert_eq!(result.tools.unwrap().matched, vec!["Rust".to_string()]);
        assert_eq!(result.matching_contacts, Some(vec![engineer]));
    }
}
