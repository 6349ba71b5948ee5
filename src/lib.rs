//! pagewright - LLM-driven static web app deployment service
//!
//! Accepts a deployment request (brief + acceptance checks), asks a
//! generative model to synthesize a static web application, publishes the
//! result to a GitHub repository with Pages hosting, and reports completion
//! to a caller-supplied callback URL.
//!
//! # Architecture
//!
//! One accepted request becomes one detached pipeline run, sequenced as
//! generate, publish, notify:
//! - Generation never fails; any error yields deterministic fallback
//!   artifacts
//! - Publishing degrades per step; only repository creation is terminal
//! - Notification retries on a fixed exponential schedule and reports a
//!   boolean outcome
//!
//! # Modules
//!
//! - `adapters`: provider clients (Anthropic Messages API, GitHub REST)
//! - `core`: pipeline logic (Generator, Publisher, Notifier, Orchestrator)
//! - `domain`: data structures (DeployRequest, ArtifactSet, DeploymentReport)
//! - `server`: HTTP front end
//! - `config`: layered configuration
//!
//! # Usage
//!
//! ```bash
//! # Start the service (reads .env, pagewright.yaml, environment)
//! pagewright
//!
//! # Provision a repository once, outside the pipeline
//! repo-bootstrap --name my-site --pages
//! ```

pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod server;

// Re-export main types at crate root for convenience
pub use config::Config;
pub use core::{Generator, Notifier, Orchestrator, Publisher, RetryPolicy, RunError, RunSet};
pub use domain::{ArtifactSet, Attachment, DeployRequest, Deployment, DeploymentReport, Stage};
pub use server::{build_router, AppState};

// Provider clients
pub use adapters::{AnthropicClient, GithubClient, ModelClient};
