//! Anthropic Messages API adapter.
//!
//! One request per generation call; the response's first text block is the
//! generated output.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use super::ModelClient;
use crate::config::Config;

/// Required API version header value
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic Messages API client
pub struct AnthropicClient {
    /// API credential
    api_key: String,
    /// Model name sent with every call
    model: String,
    /// Output budget per call
    max_tokens: u32,
    /// API base URL
    api_base: String,
    /// HTTP client
    client: reqwest::Client,
}

/// Response from the Messages API
#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

impl AnthropicClient {
    /// Create a new client
    pub fn new(
        api_key: String,
        model: String,
        max_tokens: u32,
        api_base: String,
        client: reqwest::Client,
    ) -> Self {
        Self {
            api_key,
            model,
            max_tokens,
            api_base,
            client,
        }
    }

    /// Create from resolved configuration
    pub fn from_config(config: &Config, client: reqwest::Client) -> Self {
        Self::new(
            config.anthropic_api_key.clone().unwrap_or_default(),
            config.model.clone(),
            config.max_tokens,
            config.anthropic_api_base.clone(),
            client,
        )
    }

    /// Build the messages endpoint URL
    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.api_base)
    }
}

#[async_trait]
impl ModelClient for AnthropicClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let response = self
            .client
            .post(self.messages_url())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&serde_json::json!({
                "model": self.model,
                "max_tokens": self.max_tokens,
                "messages": [{"role": "user", "content": prompt}],
            }))
            .send()
            .await
            .context("Failed to reach model API")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Model API error {status}: {body}");
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .context("Failed to parse model API response")?;

        parsed
            .content
            .into_iter()
            .find_map(|block| block.text)
            .context("Model response contained no text block")
    }
}
