//! HTTP front end.
//!
//! Two routes: a health probe and the deploy endpoint. The deploy handler
//! authenticates the shared secret, spawns the pipeline run, and returns
//! the accepted acknowledgment immediately; it never waits for the run.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::core::{Orchestrator, RunSet};
use crate::domain::DeployRequest;

/// Shared state behind every handler
pub struct AppState {
    pub config: Config,
    pub orchestrator: Orchestrator,
    pub runs: RunSet,
}

impl AppState {
    /// Build the full service state from resolved configuration
    pub fn from_config(config: Config, client: reqwest::Client) -> Self {
        let orchestrator = Orchestrator::from_config(&config, client);
        Self {
            config,
            orchestrator,
            runs: RunSet::new(),
        }
    }
}

/// Inbound deploy body: the shared secret plus the request proper
#[derive(Debug, Deserialize)]
struct DeployBody {
    #[serde(default)]
    secret: Option<String>,
    #[serde(flatten)]
    request: DeployRequest,
}

/// Assemble the router
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/deploy", post(deploy))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "message": "LLM Code Deployment API is running",
    }))
}

async fn deploy(
    State(state): State<Arc<AppState>>,
    Json(body): Json<DeployBody>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    if body.secret.as_deref() != state.config.secret.as_deref() {
        warn!(task = %body.request.task, "Rejected deploy request: invalid secret");
        return Err((
            StatusCode::FORBIDDEN,
            Json(serde_json::json!({"detail": "Invalid secret"})),
        ));
    }

    let request = body.request;
    info!(
        task = %request.task,
        round = request.round,
        "Deployment request accepted"
    );

    let task = request.task.clone();
    let round = request.round;
    let run_state = state.clone();
    state
        .runs
        .spawn(async move {
            if let Err(run_error) = run_state.orchestrator.run(request).await {
                error!(task = %task, round, error = %run_error, "Deployment run failed");
            }
        })
        .await;

    Ok(Json(serde_json::json!({
        "status": "accepted",
        "message": "Request received and processing",
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with_secret(secret: Option<&str>) -> Arc<AppState> {
        let config = Config {
            secret: secret.map(str::to_string),
            ..Config::default()
        };
        Arc::new(AppState::from_config(config, reqwest::Client::new()))
    }

    fn body(secret: Option<&str>) -> DeployBody {
        let mut value = serde_json::json!({
            "email": "dev@example.com",
            "task": "demo",
            "nonce": "n1",
            "brief": "Build something",
            "evaluation_url": "https://example.com/notify",
        });
        if let Some(secret) = secret {
            value["secret"] = serde_json::Value::String(secret.to_string());
        }
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_deploy_rejects_wrong_secret() {
        let state = state_with_secret(Some("right"));

        let result = deploy(State(state), Json(body(Some("wrong")))).await;

        let (status, payload) = result.err().unwrap();
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(payload.0["detail"], "Invalid secret");
    }

    #[tokio::test]
    async fn test_deploy_rejects_missing_secret_when_configured() {
        let state = state_with_secret(Some("right"));

        let result = deploy(State(state), Json(body(None))).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_health_shape() {
        let response = health().await;

        assert_eq!(response.0["status"], "ok");
    }
}
