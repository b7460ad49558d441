//! Service-level tests against a real Postgres
//!
//! Run with: DATABASE_URL=postgres://... cargo test -p pipewise-server -- --ignored

use std::borrow::Cow;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Duration;
use pipewise_core::{OpportunityStage, Scope, TenantId};
use pipewise_server::db::slugs::SlugTable;
use pipewise_server::db::DbError;
use pipewise_server::models::{
    OpportunityCreate, OpportunityFilter, OpportunityUpdate, Pagination, Signup, TenantCreate,
};
use pipewise_server::services::{
    insert_with_unique_slug, Actor, OpportunityService, SlugInsert, TenantService, UserService,
    MAX_SLUG_ATTEMPTS,
};
use pipewise_server::{ServiceError, MIGRATOR};
use sqlx::PgPool;
use uuid::Uuid;

async fn pool() -> PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = pipewise_server::create_pool(&url).await.unwrap();
    MIGRATOR.run(&pool).await.unwrap();
    pool
}

/// A fresh tenant; names carry a random suffix so runs do not collide.
async fn tenant(pool: &PgPool) -> TenantId {
    let name = format!("Test Tenant {}", Uuid::new_v4().simple());
    let tenant = TenantService::new(pool)
        .create(TenantCreate::new(name))
        .await
        .unwrap();
    TenantId::new(tenant.id)
}

fn is_not_found(err: &ServiceError) -> bool {
    matches!(err, ServiceError::Db(DbError::NotFound { .. }))
}

/// Tenant-slug insert that reports a unique violation on its first
/// `conflicts` attempts, as if another writer had just taken the slug.
struct RacingInsert {
    name: String,
    conflicts: usize,
    constraint: &'static str,
    attempts: AtomicUsize,
}

impl RacingInsert {
    fn new(conflicts: usize, constraint: &'static str) -> Self {
        Self {
            name: format!("Racing {}", Uuid::new_v4().simple()),
            conflicts,
            constraint,
            attempts: AtomicUsize::new(0),
        }
    }

    fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SlugInsert for RacingInsert {
    type Output = String;

    const TABLE: SlugTable = SlugTable::Tenant;

    fn slug_source(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.name)
    }

    fn requested_slug(&self) -> Option<&str> {
        None
    }

    async fn insert(
        &self,
        conn: &mut sqlx::PgConnection,
        slug: &str,
    ) -> Result<Self::Output, DbError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt <= self.conflicts {
            return Err(DbError::Conflict {
                constraint: self.constraint.to_string(),
            });
        }
        let stored: String = sqlx::query_scalar("SELECT $1::text")
            .bind(slug)
            .fetch_one(conn)
            .await?;
        Ok(stored)
    }
}

#[tokio::test]
#[ignore = "requires database"]
async fn tenant_slugs_get_numeric_suffix() {
    let pool = pool().await;
    let suffix = Uuid::new_v4().simple().to_string();
    let name = format!("Acme Inc {suffix}");
    let service = TenantService::new(&pool);

    let first = service.create(TenantCreate::new(name.clone())).await.unwrap();
    let second = service.create(TenantCreate::new(name)).await.unwrap();

    assert_eq!(first.slug, format!("acme-inc-{suffix}"));
    assert_eq!(second.slug, format!("acme-inc-{suffix}-1"));
}

#[tokio::test]
#[ignore = "requires database"]
async fn explicit_duplicate_slug_is_conflict() {
    let pool = pool().await;
    let slug = format!("taken-{}", Uuid::new_v4().simple());
    let service = TenantService::new(&pool);
    let input = |name: &str| TenantCreate {
        slug: Some(slug.clone()),
        ..TenantCreate::new(name)
    };

    service.create(input("One")).await.unwrap();
    let err = service.create(input("Two")).await.unwrap_err();
    assert!(matches!(err, ServiceError::Db(DbError::Conflict { .. })));
}

#[tokio::test]
#[ignore = "requires database"]
async fn opportunities_are_invisible_across_tenants() {
    let pool = pool().await;
    let (a, b) = (tenant(&pool).await, tenant(&pool).await);
    let service = OpportunityService::new(&pool);

    let created = service
        .create(Actor::system(a), OpportunityCreate::named("Acme"))
        .await
        .unwrap();
    let id = created.opportunity.id;

    assert!(service.get(a, id).await.is_ok());
    let err = service.get(b, id).await.unwrap_err();
    assert!(is_not_found(&err));

    let err = service
        .update(Actor::system(b), id, OpportunityUpdate::default())
        .await
        .unwrap_err();
    assert!(is_not_found(&err));
}

#[tokio::test]
#[ignore = "requires database"]
async fn opportunity_slugs_are_unique_per_tenant() {
    let pool = pool().await;
    let (a, b) = (tenant(&pool).await, tenant(&pool).await);
    let service = OpportunityService::new(&pool);

    let first = service
        .create(Actor::system(a), OpportunityCreate::named("Acme"))
        .await
        .unwrap();
    let second = service
        .create(Actor::system(a), OpportunityCreate::named("Acme"))
        .await
        .unwrap();
    let other = service
        .create(Actor::system(b), OpportunityCreate::named("Acme"))
        .await
        .unwrap();

    assert_eq!(first.opportunity.slug, "acme");
    assert_eq!(second.opportunity.slug, "acme-1");
    assert_eq!(other.opportunity.slug, "acme");
}

#[tokio::test]
#[ignore = "requires database"]
async fn pagination_total_counts_whole_result() {
    let pool = pool().await;
    let tenant = tenant(&pool).await;
    let service = OpportunityService::new(&pool);
    for name in ["One", "Two", "Three"] {
        service
            .create(Actor::system(tenant), OpportunityCreate::named(name))
            .await
            .unwrap();
    }

    let first = service
        .list(tenant, OpportunityFilter::default(), Pagination::new(1, 2))
        .await
        .unwrap();
    assert_eq!(first.items.len(), 2);
    assert_eq!(first.total, 3);

    let past_end = service
        .list(tenant, OpportunityFilter::default(), Pagination::new(5, 2))
        .await
        .unwrap();
    assert!(past_end.items.is_empty());
    assert_eq!(past_end.total, 3);

    let filtered = service
        .list(
            tenant,
            OpportunityFilter {
                search: Some("tw".into()),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(filtered.total, 1);
    assert_eq!(filtered.items[0].name, "Two");
}

#[tokio::test]
#[ignore = "requires database"]
async fn absent_notes_stay_absent_and_updates_are_audited() {
    let pool = pool().await;
    let tenant = tenant(&pool).await;
    let service = OpportunityService::new(&pool);

    let created = service
        .create(Actor::system(tenant), OpportunityCreate::named("Globex"))
        .await
        .unwrap();
    assert_eq!(created.opportunity.notes, None);
    assert_eq!(created.logs.len(), 1);
    assert_eq!(created.logs[0].operation, "create");

    let updated = service
        .update(
            Actor::system(tenant),
            created.opportunity.id,
            OpportunityUpdate {
                stage: Some(OpportunityStage::Qualified),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.opportunity.stage, OpportunityStage::Qualified);
    assert_eq!(updated.opportunity.notes, None);
    assert_eq!(updated.logs.len(), 2);
    let latest = &updated.logs[0];
    assert_eq!(latest.operation, "update");
    let diff = latest.diff.as_ref().unwrap();
    assert_eq!(diff["stage"]["old"], "identified");
    assert_eq!(diff["stage"]["new"], "qualified");
    assert!(diff.get("notes").is_none());
}

#[tokio::test]
#[ignore = "requires database"]
async fn signup_then_login() {
    let pool = pool().await;
    let users = UserService::new(&pool, Duration::hours(1));
    let email = format!("owner-{}@example.com", Uuid::new_v4().simple());

    let (user, token) = users
        .signup(Signup {
            email: email.clone(),
            password: "correct horse battery".into(),
            name: Some("Owner".into()),
            tenant_name: format!("Signup Co {}", Uuid::new_v4().simple()),
        })
        .await
        .unwrap();

    let resolved = users.resolve_session(&token.access_token).await.unwrap();
    assert_eq!(resolved.map(|u| u.id), Some(user.id));

    let profile = users.profile(user.clone()).await.unwrap();
    assert!(profile.roles.iter().any(|r| r == "application-access"));

    assert!(users.login(&email, "correct horse battery").await.is_ok());
    let err = users.login(&email, "wrong password").await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Auth(pipewise_server::auth::AuthError::InvalidCredentials)
    ));

    users.logout(&token.access_token).await.unwrap();
    assert!(users.resolve_session(&token.access_token).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires database"]
async fn slug_conflict_is_retried() {
    let pool = pool().await;
    let mut tx = pool.begin().await.unwrap();

    let item = RacingInsert::new(1, SlugTable::Tenant.constraint());
    let slug = insert_with_unique_slug(&mut tx, Scope::Global, &item)
        .await
        .unwrap();

    assert_eq!(item.attempts(), 2);
    assert!(slug.starts_with("racing-"));
}

#[tokio::test]
#[ignore = "requires database"]
async fn slug_conflict_gives_up_after_max_attempts() {
    let pool = pool().await;
    let mut tx = pool.begin().await.unwrap();

    let item = RacingInsert::new(usize::MAX, SlugTable::Tenant.constraint());
    let err = insert_with_unique_slug(&mut tx, Scope::Global, &item)
        .await
        .unwrap_err();

    assert!(err.is_conflict_on(SlugTable::Tenant.constraint()));
    assert_eq!(item.attempts(), MAX_SLUG_ATTEMPTS);
}

#[tokio::test]
#[ignore = "requires database"]
async fn other_conflicts_are_not_retried() {
    let pool = pool().await;
    let mut tx = pool.begin().await.unwrap();

    let item = RacingInsert::new(1, "uq_user_account_email");
    let err = insert_with_unique_slug(&mut tx, Scope::Global, &item)
        .await
        .unwrap_err();

    assert!(err.is_conflict_on("uq_user_account_email"));
    assert_eq!(item.attempts(), 1);
}

#[tokio::test]
#[ignore = "requires database"]
async fn concurrent_tenants_get_distinct_slugs() {
    let pool = pool().await;
    let name = format!("Concurrent {}", Uuid::new_v4().simple());

    let tasks: Vec<_> = (0..4)
        .map(|_| {
            let pool = pool.clone();
            let name = name.clone();
            tokio::spawn(async move {
                TenantService::new(&pool)
                    .create(TenantCreate::new(name))
                    .await
                    .unwrap()
                    .slug
            })
        })
        .collect();

    let mut slugs = HashSet::new();
    for task in tasks {
        slugs.insert(task.await.unwrap());
    }
    assert_eq!(slugs.len(), 4);
}
