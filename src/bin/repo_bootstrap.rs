//! One-shot GitHub repository provisioning.
//!
//! Creates a public repository for the configured account and optionally
//! enables Pages hosting, using the same credentials and API base as the
//! deployment service.

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pagewright::adapters::{GithubClient, PagesStatus, RepoCreation};
use pagewright::config::Config;
use pagewright::core::publisher::{sanitize_repo_name, DEFAULT_BRANCH};

/// repo-bootstrap - provision a GitHub repository outside the pipeline
#[derive(Parser, Debug)]
#[command(name = "repo-bootstrap")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Repository name (sanitized to the provider-safe charset)
    name: String,

    /// Repository description
    #[arg(short, long, default_value = "Static web app deployment")]
    description: String,

    /// Also enable Pages hosting on the default branch
    #[arg(long)]
    pages: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;

    if config.github_token.is_none() {
        bail!("GITHUB_TOKEN is not set");
    }
    let Some(username) = config.github_username.clone() else {
        bail!("GITHUB_USERNAME is not set");
    };

    let client = reqwest::Client::builder()
        .user_agent(concat!("pagewright/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")?;
    let github = GithubClient::from_config(&config, client);

    let name = sanitize_repo_name(&cli.name);
    eprintln!("Creating repository '{}' for {}...", name, username);

    match github.create_repo(&name, &cli.description).await? {
        RepoCreation::Created { html_url } => {
            println!("Repository created: {html_url}");
        }
        RepoCreation::AlreadyExists => {
            println!(
                "Repository already exists: https://github.com/{}/{}",
                username, name
            );
        }
    }

    if cli.pages {
        match github.enable_pages(&name, DEFAULT_BRANCH).await {
            Ok(PagesStatus::Enabled) => println!("Pages enabled"),
            Ok(PagesStatus::AlreadyEnabled) => println!("Pages already enabled"),
            Err(error) => {
                // Pages needs at least one commit on the default branch
                eprintln!("Push an initial commit to '{DEFAULT_BRANCH}' and re-run with --pages");
                return Err(error).context("Failed to enable Pages");
            }
        }
        println!("Pages URL: https://{}.github.io/{}/", username, name);
    }

    Ok(())
}
