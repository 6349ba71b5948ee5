//! pagewright service entrypoint

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pagewright::config::Config;
use pagewright::server::{build_router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before reading RUST_LOG; real environment entries win
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let config = Config::load()?;
    if let Some(ref path) = config.config_file {
        info!(config = %path.display(), "Loaded config file");
    }
    config.warn_missing_credentials();

    let client = reqwest::Client::builder()
        .user_agent(concat!("pagewright/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")?;

    let addr = format!("0.0.0.0:{}", config.port);
    let state = Arc::new(AppState::from_config(config, client));
    let app = build_router(state.clone());

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(%addr, "pagewright listening");

    let shutdown = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Shutdown signal received"),
            Err(err) => {
                error!(error = %err, "Shutdown signal unavailable");
                std::future::pending::<()>().await
            }
        }
    };
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("Server error")?;

    // Accepted runs finish before exit; they are never aborted
    state.runs.drain().await;

    Ok(())
}
