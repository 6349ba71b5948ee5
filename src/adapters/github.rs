//! GitHub REST API adapter.
//!
//! Covers exactly the calls the publish pipeline needs: repository creation,
//! content reads/writes, branch tip lookup, and Pages enablement. The API
//! base is injectable so tests can stand up a local server.

use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use crate::config::Config;

/// Errors from the hosting provider API
#[derive(Debug, Error)]
pub enum GithubError {
    #[error("GitHub API error {status}: {body}")]
    Api { status: StatusCode, body: String },

    #[error("GitHub request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Outcome of a repository-creation attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoCreation {
    /// Repository was created; URL as reported by the API
    Created { html_url: String },

    /// Repository already existed for this account
    AlreadyExists,
}

/// Outcome of a Pages-enable request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagesStatus {
    Enabled,
    AlreadyEnabled,
}

/// GitHub REST v3 client
pub struct GithubClient {
    /// Access token
    token: String,
    /// Account that owns created repositories
    username: String,
    /// API base URL
    api_base: String,
    /// HTTP client
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct CreatedRepo {
    html_url: String,
}

#[derive(Debug, Deserialize)]
struct BlobInfo {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct CommitInfo {
    sha: String,
}

impl GithubClient {
    /// Create a new client
    pub fn new(token: String, username: String, api_base: String, client: reqwest::Client) -> Self {
        Self {
            token,
            username,
            api_base,
            client,
        }
    }

    /// Create from resolved configuration
    pub fn from_config(config: &Config, client: reqwest::Client) -> Self {
        Self::new(
            config.github_token.clone().unwrap_or_default(),
            config.github_username.clone().unwrap_or_default(),
            config.github_api_base.clone(),
            client,
        )
    }

    /// Account that owns created repositories
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Build a URL under /repos/{username}/{repo}
    fn repo_url(&self, repo: &str, tail: &str) -> String {
        format!("{}/repos/{}/{}{}", self.api_base, self.username, repo, tail)
    }

    /// Attach the auth headers every call needs
    fn auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("Authorization", format!("token {}", self.token))
            .header("Accept", "application/vnd.github.v3+json")
    }

    /// Create a public repository without an auto-initialized branch.
    ///
    /// HTTP 422 means the repository already exists and is reported as
    /// [`RepoCreation::AlreadyExists`], not as an error.
    pub async fn create_repo(
        &self,
        name: &str,
        description: &str,
    ) -> Result<RepoCreation, GithubError> {
        let url = format!("{}/user/repos", self.api_base);

        let response = self
            .auth(self.client.post(&url))
            .json(&serde_json::json!({
                "name": name,
                "description": description,
                "private": false,
                "auto_init": false,
            }))
            .send()
            .await?;

        match response.status() {
            StatusCode::CREATED => {
                let repo: CreatedRepo = response.json().await?;
                Ok(RepoCreation::Created {
                    html_url: repo.html_url,
                })
            }
            StatusCode::UNPROCESSABLE_ENTITY => Ok(RepoCreation::AlreadyExists),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(GithubError::Api { status, body })
            }
        }
    }

    /// Look up the current blob sha of a file, if the file exists.
    ///
    /// Any non-200 answer is treated as "no existing file"; the subsequent
    /// write then runs without a prior-version reference.
    pub async fn file_sha(&self, repo: &str, path: &str) -> Result<Option<String>, GithubError> {
        let url = self.repo_url(repo, &format!("/contents/{path}"));

        let response = self.auth(self.client.get(&url)).send().await?;

        if response.status() == StatusCode::OK {
            let blob: BlobInfo = response.json().await?;
            Ok(Some(blob.sha))
        } else {
            Ok(None)
        }
    }

    /// Create or update a file on the default branch.
    ///
    /// Content is base64-encoded on the wire; `sha` carries the existing
    /// blob's version reference for updates.
    pub async fn put_file(
        &self,
        repo: &str,
        path: &str,
        message: &str,
        content: &str,
        sha: Option<&str>,
    ) -> Result<(), GithubError> {
        let url = self.repo_url(repo, &format!("/contents/{path}"));

        let mut body = serde_json::json!({
            "message": message,
            "content": B64.encode(content.as_bytes()),
        });
        if let Some(sha) = sha {
            body["sha"] = serde_json::Value::String(sha.to_string());
        }

        let response = self.auth(self.client.put(&url)).json(&body).send().await?;

        match response.status() {
            StatusCode::OK | StatusCode::CREATED => Ok(()),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(GithubError::Api { status, body })
            }
        }
    }

    /// Resolve the tip commit of a branch
    pub async fn branch_head(&self, repo: &str, branch: &str) -> Result<String, GithubError> {
        let url = self.repo_url(repo, &format!("/commits/{branch}"));

        let response = self.auth(self.client.get(&url)).send().await?;

        match response.status() {
            StatusCode::OK => {
                let commit: CommitInfo = response.json().await?;
                Ok(commit.sha)
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(GithubError::Api { status, body })
            }
        }
    }

    /// Enable Pages hosting for a repository, rooted at `/` on `branch`.
    ///
    /// HTTP 409 means Pages was already enabled and counts as success.
    pub async fn enable_pages(&self, repo: &str, branch: &str) -> Result<PagesStatus, GithubError> {
        let url = self.repo_url(repo, "/pages");

        let response = self
            .auth(self.client.post(&url))
            .json(&serde_json::json!({
                "source": {"branch": branch, "path": "/"},
            }))
            .send()
            .await?;

        match response.status() {
            StatusCode::CREATED => Ok(PagesStatus::Enabled),
            StatusCode::CONFLICT => Ok(PagesStatus::AlreadyEnabled),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(GithubError::Api { status, body })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GithubClient {
        GithubClient::new(
            "TOKEN".to_string(),
            "octocat".to_string(),
            "https://api.github.com".to_string(),
            reqwest::Client::new(),
        )
    }

    #[test]
    fn test_repo_url() {
        assert_eq!(
            client().repo_url("demo-round1", "/contents/index.html"),
            "https://api.github.com/repos/octocat/demo-round1/contents/index.html"
        );
        assert_eq!(
            client().repo_url("demo-round1", "/pages"),
            "https://api.github.com/repos/octocat/demo-round1/pages"
        );
    }
}
