//! Pipeline orchestration for deployment runs.
//!
//! One accepted request becomes one run: generate, publish, notify, in
//! strict sequence. Runs are spawned as independent tasks through
//! [`RunSet`] so a failure in one cannot affect another and the process can
//! drain outstanding runs at shutdown.

use std::future::Future;

use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::adapters::{AnthropicClient, GithubClient};
use crate::config::Config;
use crate::domain::{DeployRequest, DeploymentReport, Stage};

use super::generator::Generator;
use super::notifier::Notifier;
use super::publisher::{PublishError, Publisher};

/// A run failed in one of its stages.
///
/// Generation cannot fail (it falls back internally), so only the publish
/// and notify stages appear here. The callback is never invoked for a run
/// that failed before the notify stage.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("publish failed: {0}")]
    Publish(#[from] PublishError),

    #[error("callback delivery to {url} failed after all attempts")]
    Notify { url: String },
}

/// Drives one request through the full pipeline
pub struct Orchestrator {
    generator: Generator<AnthropicClient>,
    publisher: Publisher,
    notifier: Notifier,
}

impl Orchestrator {
    /// Create an orchestrator from already-built components
    pub fn new(
        generator: Generator<AnthropicClient>,
        publisher: Publisher,
        notifier: Notifier,
    ) -> Self {
        Self {
            generator,
            publisher,
            notifier,
        }
    }

    /// Wire up all components from resolved configuration
    pub fn from_config(config: &Config, client: reqwest::Client) -> Self {
        Self::new(
            Generator::new(AnthropicClient::from_config(config, client.clone())),
            Publisher::new(GithubClient::from_config(config, client.clone())),
            Notifier::new(client),
        )
    }

    /// Run the full pipeline for one request.
    ///
    /// Stages never overlap: generation completes before publishing starts,
    /// publishing completes before the callback is attempted.
    #[instrument(skip(self, request), fields(task = %request.task, round = request.round))]
    pub async fn run(&self, request: DeployRequest) -> Result<DeploymentReport, RunError> {
        let run_id = Uuid::new_v4();

        info!(%run_id, stage = %Stage::Generating, "Generating artifacts");
        let files = self.generator.generate(&request).await;

        info!(%run_id, stage = %Stage::Publishing, files = files.len(), "Publishing artifacts");
        let deployment = self
            .publisher
            .publish(&request.task, request.round, files)
            .await?;

        let report = DeploymentReport::new(&request, &deployment);

        info!(
            %run_id,
            stage = %Stage::Notifying,
            url = %request.evaluation_url,
            "Delivering completion callback"
        );
        if !self.notifier.notify(&request.evaluation_url, &report).await {
            return Err(RunError::Notify {
                url: request.evaluation_url,
            });
        }

        info!(
            %run_id,
            stage = %Stage::Done,
            repo = %deployment.repo_name,
            commit = %deployment.commit_sha,
            "Run complete"
        );
        Ok(report)
    }
}

/// Tracks spawned run tasks so shutdown can drain them.
///
/// Handles are swept opportunistically on each spawn; `drain` awaits every
/// outstanding run to completion (runs are never aborted).
#[derive(Default)]
pub struct RunSet {
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl RunSet {
    /// Create an empty run set
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn a run task and retain its handle
    pub async fn spawn(&self, run: impl Future<Output = ()> + Send + 'static) {
        let mut handles = self.handles.lock().await;
        handles.retain(|handle| !handle.is_finished());
        handles.push(tokio::spawn(run));
    }

    /// Number of runs still outstanding
    pub async fn outstanding(&self) -> usize {
        let handles = self.handles.lock().await;
        handles.iter().filter(|h| !h.is_finished()).count()
    }

    /// Await every outstanding run
    pub async fn drain(&self) {
        let handles: Vec<JoinHandle<()>> = {
            let mut guard = self.handles.lock().await;
            guard.drain(..).collect()
        };

        if !handles.is_empty() {
            info!(runs = handles.len(), "Draining outstanding runs");
        }

        for handle in handles {
            if let Err(join_error) = handle.await {
                error!(error = %join_error, "Run task ended abnormally");
            }
        }
    }
}
