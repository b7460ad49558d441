//! pipewise CLI - multi-tenant CRM server and administration
//!
//! - `serve`: run the HTTP API and frontend shell
//! - `manage`: users, tenants, keys and database migrations
//! - `jobs extract`: run the job post extractor on a saved page
//! - `completions`: shell completion scripts

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use pipewise_core::Settings;

mod commands;
mod tracing_setup;

#[derive(Parser, Debug)]
#[command(
    name = "pipewise",
    author,
    version,
    about = "Multi-tenant CRM: opportunities, companies, people and job posts",
    long_about = "Run the pipewise API server, manage tenants, users and the database schema, \
                  and extract job post details from saved pages."
)]
struct Cli {
    /// Enable debug logging (RUST_LOG still wins)
    #[arg(long, global = true)]
    debug: bool,

    /// Export traces over OTLP (requires the telemetry feature)
    #[arg(long, global = true)]
    otel: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API server
    Serve(commands::serve::ServeArgs),
    /// Administrative tasks: users, tenants, keys, database
    Manage(commands::manage::ManageArgs),
    /// Job post extraction
    Jobs(commands::jobs::JobsArgs),
    /// Generate shell completion scripts
    Completions(CompletionsArgs),
}

#[derive(Parser, Debug)]
struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    shell: clap_complete::Shell,
}

fn run_completions(args: CompletionsArgs) -> Result<()> {
    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    clap_complete::generate(args.shell, &mut cmd, bin_name, &mut std::io::stdout());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let command = match cli.command {
        Commands::Completions(args) => return run_completions(args),
        command => command,
    };

    let settings = Settings::load().context("Failed to load settings")?;
    let tracing_config = tracing_setup::TracingConfig::new(&settings.log, cli.debug, cli.otel);
    tracing_setup::init(&tracing_config).ok();

    let result = match command {
        Commands::Serve(args) => commands::run_serve(args, settings).await,
        Commands::Manage(args) => commands::run_manage(args, settings).await,
        Commands::Jobs(args) => commands::run_jobs(args, settings).await,
        Commands::Completions(_) => Ok(()),
    };

    tracing_setup::shutdown_otel();
    result
}
