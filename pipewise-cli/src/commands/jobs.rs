//! Job post extraction from saved pages

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use pipewise_core::Settings;
use pipewise_extract::{Extraction, JobPostExtractor};
use pipewise_server::services::JobPostService;

#[derive(Args, Debug)]
pub struct JobsArgs {
    #[command(subcommand)]
    pub command: JobsCommand,
}

#[derive(Subcommand, Debug)]
pub enum JobsCommand {
    /// Extract job post details from an HTML page
    Extract(ExtractArgs),
}

#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// HTML file of the job post page
    #[arg(long = "in", value_name = "PATH")]
    pub input: PathBuf,

    /// Page URL, stored with the job post
    #[arg(long)]
    pub url: Option<String>,

    /// Print the extraction as JSON
    #[arg(long)]
    pub json: bool,

    /// Persist a complete extraction as a job post (and its company)
    #[arg(long)]
    pub save: bool,
}

pub async fn run_jobs(args: JobsArgs, settings: Settings) -> Result<()> {
    match args.command {
        JobsCommand::Extract(args) => run_extract(args, settings).await,
    }
}

async fn run_extract(args: ExtractArgs, settings: Settings) -> Result<()> {
    let html = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;

    let extractor = JobPostExtractor::from_settings(&settings.openai)
        .context("Job post extraction needs OPENAI_API_KEY")?;
    tracing::info!(model = extractor.model(), path = %args.input.display(), "extracting job post");

    let extraction = extractor.extract(&html).await.context("Extraction failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&extraction)?);
    } else {
        print_summary(&extraction);
    }

    if args.save {
        match &extraction {
            Extraction::Complete(details) => {
                let pool = super::connect(&settings).await?;
                let job_post = JobPostService::new(&pool, settings.logo_dev_token.as_deref())
                    .create_from_extraction(details.clone(), args.url, Some(html))
                    .await
                    .context("Failed to save job post")?;
                println!("Saved job post {}", job_post.id);
            }
            Extraction::Incomplete { missing, .. } => {
                tracing::warn!(?missing, "incomplete extraction not saved");
            }
        }
    }

    Ok(())
}

fn print_summary(extraction: &Extraction) {
    match extraction {
        Extraction::Complete(details) => {
            println!("Title:   {}", details.title);
            println!("Company: {}", details.company.label());
            if !details.tools.is_empty() {
                let tools: Vec<&str> = details.tools.iter().map(|t| t.name.as_str()).collect();
                println!("Tools:   {}", tools.join(", "));
            }
        }
        Extraction::Incomplete { missing, .. } => {
            println!("Incomplete extraction, missing: {missing:?}");
        }
    }
}
