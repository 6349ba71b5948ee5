//! Deployment outcomes and the callback payload.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::request::DeployRequest;

/// Durable locations of a published artifact set.
///
/// The repository name is a pure function of (task, round), so repeated
/// publishes for the same pair converge on a single repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
    /// Sanitized repository name
    pub repo_name: String,

    /// Human-facing repository URL
    pub repo_url: String,

    /// Static-site hosting URL
    pub pages_url: String,

    /// Default-branch tip commit, or "unknown" when the lookup failed
    pub commit_sha: String,
}

/// Payload delivered to the callback URL after a successful publish.
///
/// Field names are the wire contract; correlation fields are copied from
/// the request unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentReport {
    pub email: String,
    pub task: String,
    pub round: u32,
    pub nonce: String,
    pub repo_url: String,
    pub commit_sha: String,
    pub pages_url: String,
}

impl DeploymentReport {
    /// Combine a request's correlation fields with a publish outcome
    pub fn new(request: &DeployRequest, deployment: &Deployment) -> Self {
        Self {
            email: request.email.clone(),
            task: request.task.clone(),
            round: request.round,
            nonce: request.nonce.clone(),
            repo_url: deployment.repo_url.clone(),
            commit_sha: deployment.commit_sha.clone(),
            pages_url: deployment.pages_url.clone(),
        }
    }
}

/// Pipeline stage of one orchestrator run.
///
/// Stages run strictly in sequence; a run that fails in a stage never
/// reaches the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Generating,
    Publishing,
    Notifying,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Generating => "generating",
            Stage::Publishing => "publishing",
            Stage::Notifying => "notifying",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}
