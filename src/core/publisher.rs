//! Publishing artifact sets to hosted repositories.
//!
//! One publish provisions (or reuses) a repository, writes every artifact
//! plus the license, resolves the branch tip, and enables Pages hosting.
//! Only repository creation can fail the publish as a whole; every later
//! step degrades gracefully so a partially successful publish still returns
//! a usable handle.

use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::adapters::{GithubClient, GithubError, PagesStatus, RepoCreation};
use crate::domain::{ArtifactSet, Deployment, LICENSE_FILE};

/// Branch every artifact is written to
pub const DEFAULT_BRANCH: &str = "main";

/// Commit reference reported when the tip lookup fails
pub const UNKNOWN_COMMIT: &str = "unknown";

/// Repository names are truncated to this many characters
const MAX_REPO_NAME_LEN: usize = 100;

/// License written into every published repository
pub const LICENSE_TEXT: &str = r#"MIT License

Copyright (c) 2025

Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the "Software"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all
copies or substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
SOFTWARE.
"#;

/// Terminal publish failures.
///
/// Per-file writes, the commit lookup, and Pages enablement recover locally
/// and never surface here.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("repository creation failed: {0}")]
    CreateRepo(#[from] GithubError),
}

/// Publishes artifact sets through the hosting provider
pub struct Publisher {
    github: GithubClient,
}

impl Publisher {
    /// Create a publisher over the given hosting client
    pub fn new(github: GithubClient) -> Self {
        Self { github }
    }

    /// Publish an artifact set for (task, round).
    ///
    /// Re-publishing the same pair reuses the existing repository; file
    /// writes then update the previous contents in place.
    #[instrument(skip(self, files), fields(task = %task, round))]
    pub async fn publish(
        &self,
        task: &str,
        round: u32,
        mut files: ArtifactSet,
    ) -> Result<Deployment, PublishError> {
        let name = repo_name(task, round);
        let description = format!("Generated application for {task}");

        let repo_url = match self.github.create_repo(&name, &description).await? {
            RepoCreation::Created { html_url } => {
                info!(repo = %name, "Repository created");
                html_url
            }
            RepoCreation::AlreadyExists => {
                info!(repo = %name, "Repository already exists, reusing");
                format!("https://github.com/{}/{}", self.github.username(), name)
            }
        };

        files.insert(LICENSE_FILE, LICENSE_TEXT);

        for (path, content) in files.iter() {
            match self.write_file(&name, path, content).await {
                Ok(()) => info!(repo = %name, file = path, "Uploaded file"),
                Err(error) => {
                    warn!(repo = %name, file = path, error = %error, "File write failed, skipping")
                }
            }
        }

        let commit_sha = match self.github.branch_head(&name, DEFAULT_BRANCH).await {
            Ok(sha) => sha,
            Err(error) => {
                warn!(repo = %name, error = %error, "Commit lookup failed");
                UNKNOWN_COMMIT.to_string()
            }
        };

        match self.github.enable_pages(&name, DEFAULT_BRANCH).await {
            Ok(PagesStatus::Enabled) => info!(repo = %name, "Pages hosting enabled"),
            Ok(PagesStatus::AlreadyEnabled) => {
                info!(repo = %name, "Pages hosting already enabled")
            }
            Err(error) => warn!(repo = %name, error = %error, "Pages enablement failed"),
        }

        let pages_url = format!("https://{}.github.io/{}/", self.github.username(), name);

        Ok(Deployment {
            repo_name: name,
            repo_url,
            pages_url,
            commit_sha,
        })
    }

    /// Create or update one file on the default branch
    async fn write_file(&self, repo: &str, path: &str, content: &str) -> Result<(), GithubError> {
        let sha = self.github.file_sha(repo, path).await?;
        let message = match sha {
            Some(_) => format!("Update {path}"),
            None => format!("Add {path}"),
        };

        self.github
            .put_file(repo, path, &message, content, sha.as_deref())
            .await
    }
}

/// Repository name for (task, round): `sanitize("{task}-round{round}")`
pub fn repo_name(task: &str, round: u32) -> String {
    sanitize_repo_name(&format!("{task}-round{round}"))
}

/// Replace every character outside `[A-Za-z0-9-]` with `-` and truncate
/// to the provider's length bound. Pure.
pub fn sanitize_repo_name(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' {
                c
            } else {
                '-'
            }
        })
        .take(MAX_REPO_NAME_LEN)
        .collect()
}
