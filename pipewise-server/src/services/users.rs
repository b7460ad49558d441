//! Accounts: signup, login, sessions, tenant-scoped user admin and roles

use chrono::{Duration, Utc};
use pipewise_core::TenantId;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::{tenants, ServiceResult};
use crate::auth::{self, AuthError};
use crate::db::repos::roles::{APPLICATION_ACCESS, SUPERUSER};
use crate::db::repos::{RoleRepo, SessionRepo, UserRepo};
use crate::db::DbError;
use crate::models::{
    Paginated, Pagination, Signup, TenantCreate, TokenResponse, User, UserCreate, UserUpdate,
};

/// A user together with their role slugs.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Profile {
    #[serde(flatten)]
    pub user: User,
    pub roles: Vec<String>,
}

async fn hash_password(password: String) -> Result<String, AuthError> {
    tokio::task::spawn_blocking(move || auth::hash_password(&password))
        .await
        .map_err(|e| AuthError::Crypto(e.to_string()))?
}

async fn verify_password(password: String, hash: String) -> Result<bool, AuthError> {
    tokio::task::spawn_blocking(move || auth::verify_password(&password, &hash))
        .await
        .map_err(|e| AuthError::Crypto(e.to_string()))?
}

pub struct UserService<'a> {
    pool: &'a PgPool,
    session_ttl: Duration,
}

impl<'a> UserService<'a> {
    pub fn new(pool: &'a PgPool, session_ttl: Duration) -> Self {
        Self { pool, session_ttl }
    }

    async fn issue_session(&self, conn: &mut PgConnection, user_id: Uuid) -> Result<TokenResponse, DbError> {
        let token = auth::generate_token();
        let expires_at = Utc::now() + self.session_ttl;
        SessionRepo::new(conn)
            .insert(user_id, &auth::token_digest(&token), expires_at)
            .await?;
        Ok(TokenResponse::bearer(token, expires_at))
    }

    /// Insert a user with the default role, and the superuser role when
    /// flagged.
    async fn create_in(
        conn: &mut PgConnection,
        tenant: TenantId,
        input: &UserCreate,
        hashed_password: &str,
    ) -> Result<User, DbError> {
        let user = UserRepo::new(&mut *conn)
            .insert(tenant, &input.email, input.name.as_deref(), hashed_password, input.is_superuser)
            .await?;
        let mut roles = RoleRepo::new(&mut *conn);
        let access = roles.get_by_slug(APPLICATION_ACCESS).await?;
        roles.assign(user.id, access.id).await?;
        if input.is_superuser {
            let superuser = roles.get_by_slug(SUPERUSER).await?;
            roles.assign(user.id, superuser.id).await?;
        }
        tracing::info!(user_id = %user.id, tenant_id = %tenant, "created user");
        Ok(user)
    }

    /// Create a tenant and its first user, and log the user in.
    pub async fn signup(&self, input: Signup) -> ServiceResult<(User, TokenResponse)> {
        let input = input.validated()?;
        let hashed = hash_password(input.password.clone()).await?;

        let mut tx = self.pool.begin().await?;
        let tenant = tenants::create_in(&mut tx, &TenantCreate::new(input.tenant_name.clone())).await?;
        let user_input = UserCreate {
            email: input.email,
            name: input.name,
            password: input.password,
            is_superuser: false,
        };
        let user = Self::create_in(&mut tx, TenantId::new(tenant.id), &user_input, &hashed).await?;
        let token = self.issue_session(&mut tx, user.id).await?;
        tx.commit().await?;
        Ok((user, token))
    }

    /// Exchange email and password for a session token.
    ///
    /// Unknown email, wrong password and inactive account all yield the
    /// same [`AuthError::InvalidCredentials`].
    pub async fn login(&self, email: &str, password: &str) -> ServiceResult<TokenResponse> {
        let email = email.trim().to_lowercase();
        let mut tx = self.pool.begin().await?;
        let Some(found) = UserRepo::new(&mut tx).credentials(&email).await? else {
            return Err(AuthError::InvalidCredentials.into());
        };
        let Some(hash) = found.hashed_password.filter(|_| found.user.is_active) else {
            return Err(AuthError::InvalidCredentials.into());
        };
        if !verify_password(password.to_string(), hash).await? {
            tracing::debug!(user_id = %found.user.id, "password mismatch");
            return Err(AuthError::InvalidCredentials.into());
        }
        let token = self.issue_session(&mut tx, found.user.id).await?;
        tx.commit().await?;
        Ok(token)
    }

    pub async fn logout(&self, token: &str) -> ServiceResult<()> {
        let mut tx = self.pool.begin().await?;
        SessionRepo::new(&mut tx).delete(&auth::token_digest(token)).await?;
        tx.commit().await?;
        Ok(())
    }

    /// The active user behind a bearer token.
    pub async fn resolve_session(&self, token: &str) -> ServiceResult<Option<User>> {
        let mut tx = self.pool.begin().await?;
        let user = SessionRepo::new(&mut tx).resolve(&auth::token_digest(token)).await?;
        tx.commit().await?;
        Ok(user)
    }

    pub async fn profile(&self, user: User) -> ServiceResult<Profile> {
        let mut tx = self.pool.begin().await?;
        let roles = RoleRepo::new(&mut tx).slugs_for(user.id).await?;
        tx.commit().await?;
        Ok(Profile { user, roles })
    }

    pub async fn create(&self, tenant: TenantId, input: UserCreate) -> ServiceResult<User> {
        let input = input.validated()?;
        let hashed = hash_password(input.password.clone()).await?;
        let mut tx = self.pool.begin().await?;
        let user = Self::create_in(&mut tx, tenant, &input, &hashed).await?;
        tx.commit().await?;
        Ok(user)
    }

    pub async fn get(&self, tenant: TenantId, id: Uuid) -> ServiceResult<User> {
        let mut tx = self.pool.begin().await?;
        let user = UserRepo::new(&mut tx).get(tenant, id).await?;
        tx.commit().await?;
        Ok(user)
    }

    pub async fn list(&self, tenant: TenantId, page: Pagination) -> ServiceResult<Paginated<User>> {
        let mut tx = self.pool.begin().await?;
        let users = UserRepo::new(&mut tx).list(tenant, page).await?;
        tx.commit().await?;
        Ok(users)
    }

    pub async fn update(&self, tenant: TenantId, id: Uuid, changes: UserUpdate) -> ServiceResult<User> {
        let changes = changes.validated()?;
        let hashed = match changes.password.clone() {
            Some(password) => Some(hash_password(password).await?),
            None => None,
        };
        let mut tx = self.pool.begin().await?;
        let user = UserRepo::new(&mut tx)
            .update(
                tenant,
                id,
                changes.name.as_deref(),
                hashed.as_deref(),
                changes.is_active,
                changes.is_superuser,
            )
            .await?;
        tx.commit().await?;
        Ok(user)
    }

    pub async fn delete(&self, tenant: TenantId, id: Uuid) -> ServiceResult<()> {
        let mut tx = self.pool.begin().await?;
        UserRepo::new(&mut tx).delete(tenant, id).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Grant a role to the user with `email` in `tenant`.
    pub async fn assign_role(&self, tenant: TenantId, role_slug: &str, email: &str) -> ServiceResult<User> {
        let email = pipewise_core::validation::email(email)?;
        let mut tx = self.pool.begin().await?;
        let role = RoleRepo::new(&mut tx).get_by_slug(role_slug).await?;
        let user = UserRepo::new(&mut tx).get_by_email(tenant, &email).await?;
        RoleRepo::new(&mut tx).assign(user.id, role.id).await?;
        tx.commit().await?;
        tracing::info!(user_id = %user.id, role = role_slug, "assigned role");
        Ok(user)
    }

    pub async fn revoke_role(&self, tenant: TenantId, role_slug: &str, email: &str) -> ServiceResult<User> {
        let email = pipewise_core::validation::email(email)?;
        let mut tx = self.pool.begin().await?;
        let role = RoleRepo::new(&mut tx).get_by_slug(role_slug).await?;
        let user = UserRepo::new(&mut tx).get_by_email(tenant, &email).await?;
        if !RoleRepo::new(&mut tx).revoke(user.id, role.id).await? {
            return Err(DbError::not_found("role assignment", format!("{role_slug}/{email}")).into());
        }
        tx.commit().await?;
        tracing::info!(user_id = %user.id, role = role_slug, "revoked role");
        Ok(user)
    }
}
