//! Adapter clients for external providers.
//!
//! Adapters wrap the model and hosting provider HTTP APIs behind typed
//! methods; pipeline components never assemble raw requests themselves.

pub mod anthropic;
pub mod github;

use anyhow::Result;
use async_trait::async_trait;

// Re-export the provider clients
pub use anthropic::AnthropicClient;
pub use github::{GithubClient, GithubError, PagesStatus, RepoCreation};

/// Trait for generative model providers
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Single-shot completion: one instruction in, generated text out
    async fn complete(&self, prompt: &str) -> Result<String>;
}
