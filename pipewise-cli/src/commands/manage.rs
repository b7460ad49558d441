//! System administration: keys, users, tenants and the database schema

use std::io::IsTerminal;

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use inquire::{Confirm, Password, Text};
use pipewise_core::{Settings, TenantId};
use pipewise_server::auth::random_key;
use pipewise_server::models::{TenantCreate, UserCreate};
use pipewise_server::services::{TenantService, UserService};
use pipewise_server::MIGRATOR;
use sqlx::PgPool;

#[derive(Args, Debug)]
pub struct ManageArgs {
    /// Database URL (overrides config/environment)
    #[arg(long, global = true)]
    pub database_url: Option<String>,

    #[command(subcommand)]
    pub command: ManageCommand,
}

#[derive(Subcommand, Debug)]
pub enum ManageCommand {
    /// Print a random hex key, e.g. for session secrets
    GenerateRandomKey {
        /// Number of random bytes
        #[arg(long, default_value_t = 32)]
        length: usize,
    },
    /// Create a user; prompts for anything not given
    CreateUser(CreateUserArgs),
    /// Create a tenant
    CreateTenant {
        /// Tenant name
        #[arg(long)]
        name: String,
        /// Explicit slug (derived from the name when omitted)
        #[arg(long)]
        slug: Option<String>,
    },
    /// Apply all outstanding migrations
    UpgradeDatabase,
    /// Revert migrations
    DowngradeDatabase {
        /// Revert everything newer than this version (default: the latest one only)
        #[arg(long)]
        target: Option<i64>,
    },
    /// Show the latest applied migration
    ShowCurrentDatabaseRevision,
    /// Drop everything and re-apply all migrations
    ResetDatabase {
        /// Do not ask for confirmation
        #[arg(long)]
        no_prompt: bool,
    },
    /// Drop every table, including migration history
    PurgeDatabase {
        /// Do not ask for confirmation
        #[arg(long)]
        no_prompt: bool,
    },
}

#[derive(Args, Debug)]
pub struct CreateUserArgs {
    /// Email of the new user
    #[arg(long)]
    pub email: Option<String>,
    /// Full name of the new user
    #[arg(long)]
    pub name: Option<String>,
    /// Password (prompted without echo when omitted)
    #[arg(long)]
    pub password: Option<String>,
    /// Slug of the tenant the user belongs to
    #[arg(long)]
    pub tenant: Option<String>,
    /// Grant the superuser role
    #[arg(long)]
    pub superuser: bool,
}

fn interactive() -> bool {
    std::io::stdin().is_terminal() && std::io::stdout().is_terminal()
}

/// The given value, or a prompt when attached to a terminal.
fn value_or_prompt(value: Option<String>, label: &str) -> Result<String> {
    match value {
        Some(v) => Ok(v),
        None if interactive() => Text::new(label).prompt().context("Prompt cancelled"),
        None => bail!("{label} is required when not running interactively"),
    }
}

fn password_or_prompt(value: Option<String>) -> Result<String> {
    match value {
        Some(v) => Ok(v),
        None if interactive() => Password::new("Password:")
            .prompt()
            .context("Prompt cancelled"),
        None => bail!("--password is required when not running interactively"),
    }
}

/// `true` when the user agreed or `no_prompt` was given.
fn confirmed(no_prompt: bool, question: &str) -> Result<bool> {
    if no_prompt {
        return Ok(true);
    }
    if !interactive() {
        bail!("refusing to continue without confirmation; pass --no-prompt");
    }
    Confirm::new(question)
        .with_default(false)
        .prompt()
        .context("Prompt cancelled")
}

pub async fn run_manage(args: ManageArgs, mut settings: Settings) -> Result<()> {
    if let ManageCommand::GenerateRandomKey { length } = args.command {
        println!("{}", random_key(length));
        return Ok(());
    }

    if let Some(url) = args.database_url {
        settings.database.url = Some(url);
    }
    let pool = super::connect(&settings).await?;

    match args.command {
        ManageCommand::GenerateRandomKey { .. } => {}
        ManageCommand::CreateUser(user) => create_user(&pool, &settings, user).await?,
        ManageCommand::CreateTenant { name, slug } => {
            let tenant = TenantService::new(&pool)
                .create(TenantCreate {
                    slug,
                    ..TenantCreate::new(name)
                })
                .await
                .context("Failed to create tenant")?;
            println!("Tenant created: {} ({})", tenant.slug, tenant.id);
        }
        ManageCommand::UpgradeDatabase => {
            MIGRATOR.run(&pool).await.context("Migration failed")?;
            print_revision(&pool).await?;
        }
        ManageCommand::DowngradeDatabase { target } => {
            let target = match target {
                Some(target) => target,
                None => previous_version(&pool).await?,
            };
            MIGRATOR
                .undo(&pool, target)
                .await
                .context("Downgrade failed")?;
            print_revision(&pool).await?;
        }
        ManageCommand::ShowCurrentDatabaseRevision => print_revision(&pool).await?,
        ManageCommand::ResetDatabase { no_prompt } => {
            if !confirmed(no_prompt, "Drop and recreate everything?")? {
                println!("Aborting database reset.");
                return Ok(());
            }
            drop_everything(&pool).await?;
            tracing::info!("recreating the schema");
            MIGRATOR.run(&pool).await.context("Migration failed")?;
            print_revision(&pool).await?;
        }
        ManageCommand::PurgeDatabase { no_prompt } => {
            if !confirmed(no_prompt, "Drop everything?")? {
                println!("Aborting database purge.");
                return Ok(());
            }
            drop_everything(&pool).await?;
        }
    }

    Ok(())
}

async fn create_user(pool: &PgPool, settings: &Settings, args: CreateUserArgs) -> Result<()> {
    let email = value_or_prompt(args.email, "Email:")?;
    let name = value_or_prompt(args.name, "Full name:")?;
    let password = password_or_prompt(args.password)?;
    let tenant_slug = value_or_prompt(args.tenant, "Tenant slug:")?;

    let tenant = TenantService::new(pool)
        .get_by_slug(&tenant_slug)
        .await
        .with_context(|| format!("Unknown tenant '{tenant_slug}'"))?;

    let ttl = chrono::Duration::hours(settings.auth.session_ttl_hours);
    let user = UserService::new(pool, ttl)
        .create(
            TenantId::new(tenant.id),
            UserCreate {
                email,
                name: Some(name),
                password,
                is_superuser: args.superuser,
            },
        )
        .await
        .context("Failed to create user")?;

    println!("User created: {}", user.email);
    Ok(())
}

/// Applied migrations, newest first. Empty when the history table is absent.
async fn applied(pool: &PgPool) -> Result<Vec<(i64, String)>> {
    let exists: Option<String> =
        sqlx::query_scalar("SELECT to_regclass('_sqlx_migrations')::text")
            .fetch_one(pool)
            .await?;
    if exists.is_none() {
        return Ok(Vec::new());
    }
    let rows = sqlx::query_as(
        "SELECT version, description FROM _sqlx_migrations WHERE success ORDER BY version DESC",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

async fn previous_version(pool: &PgPool) -> Result<i64> {
    let applied = applied(pool).await?;
    if applied.is_empty() {
        bail!("no migrations applied");
    }
    Ok(applied.get(1).map(|(version, _)| *version).unwrap_or(0))
}

async fn print_revision(pool: &PgPool) -> Result<()> {
    match applied(pool).await?.first() {
        Some((version, description)) => println!("Current revision: {version} ({description})"),
        None => println!("No migrations applied"),
    }
    Ok(())
}

async fn drop_everything(pool: &PgPool) -> Result<()> {
    tracing::warn!("dropping all database objects");
    sqlx::raw_sql("DROP SCHEMA public CASCADE; CREATE SCHEMA public;")
        .execute(pool)
        .await
        .context("Failed to drop schema")?;
    tracing::info!("successfully dropped all objects");
    Ok(())
}
