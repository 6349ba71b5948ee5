//! Callback delivery with bounded retry.
//!
//! The notifier POSTs the completion report to the caller-supplied URL.
//! Delivery is judged successful only on HTTP 200; everything else (other
//! statuses, transport errors, timeouts) consumes one attempt from a fixed
//! exponential schedule. The caller observes only a boolean.

use std::time::Duration;

use anyhow::Result;
use tracing::{error, info, warn};

use crate::domain::DeploymentReport;

/// Per-attempt request timeout
const DELIVERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Retry policy for failed attempts
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including first try)
    pub max_attempts: u32,

    /// Initial delay between retries in milliseconds
    pub initial_delay_ms: u64,

    /// Maximum delay between retries in milliseconds
    pub max_delay_ms: u64,

    /// Backoff multiplier (delay *= multiplier after each retry)
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay_ms: 1000,
            max_delay_ms: 16_000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Calculate delay for a specific attempt (1-indexed)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::from_millis(self.initial_delay_ms);
        }

        let delay =
            self.initial_delay_ms as f64 * self.backoff_multiplier.powi((attempt - 1) as i32);

        let capped = delay.min(self.max_delay_ms as f64) as u64;
        Duration::from_millis(capped)
    }

    /// Check if we should retry based on attempt count
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

/// Delivers completion reports to callback URLs
pub struct Notifier {
    client: reqwest::Client,
    policy: RetryPolicy,
    request_timeout: Duration,
}

impl Notifier {
    /// Create a notifier with the production schedule (5 attempts,
    /// 1/2/4/8 s slept delays, 30 s per-attempt timeout)
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_policy(client, RetryPolicy::default(), DELIVERY_TIMEOUT)
    }

    /// Create a notifier with an explicit schedule
    pub fn with_policy(
        client: reqwest::Client,
        policy: RetryPolicy,
        request_timeout: Duration,
    ) -> Self {
        Self {
            client,
            policy,
            request_timeout,
        }
    }

    /// Deliver a report, retrying per the policy.
    ///
    /// The identical body is re-sent on every attempt. Never panics or
    /// returns an error; exhaustion yields `false`.
    pub async fn notify(&self, url: &str, report: &DeploymentReport) -> bool {
        let mut attempt = 0u32;

        loop {
            attempt += 1;

            match self.attempt(url, report).await {
                Ok(()) => {
                    info!(url, attempt, "Completion callback delivered");
                    return true;
                }
                Err(error) => {
                    if self.policy.should_retry(attempt) {
                        let delay = self.policy.delay_for_attempt(attempt);
                        warn!(
                            url,
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            error = %error,
                            "Callback delivery failed, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }

                    error!(
                        url,
                        attempts = attempt,
                        error = %error,
                        "Callback delivery failed permanently"
                    );
                    return false;
                }
            }
        }
    }

    /// One delivery attempt; anything but HTTP 200 is a failure
    async fn attempt(&self, url: &str, report: &DeploymentReport) -> Result<()> {
        let response = self
            .client
            .post(url)
            .timeout(self.request_timeout)
            .json(report)
            .send()
            .await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            anyhow::bail!("callback returned {status}");
        }

        Ok(())
    }
}
