//! End-to-End Pipeline Tests
//!
//! Runs the full accept-generate-publish-notify flow against local
//! stand-ins for the model API, the hosting API, and the callback receiver.

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use serde_json::{json, Value};
use tokio::sync::Mutex;

use pagewright::adapters::{AnthropicClient, GithubClient};
use pagewright::config::Config;
use pagewright::core::{Generator, Notifier, Orchestrator, Publisher, RetryPolicy, RunError};
use pagewright::domain::DeployRequest;
use pagewright::server::{build_router, AppState};

// ---- model API stand-in ----

#[derive(Clone, Default)]
struct ModelState {
    fail: Arc<AtomicBool>,
}

async fn messages(State(state): State<ModelState>) -> (StatusCode, Json<Value>) {
    if state.fail.load(Ordering::SeqCst) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"type": "error", "error": {"message": "Overloaded"}})),
        );
    }

    let artifact_object = json!({
        "index.html": "<html><body>model output</body></html>",
        "README.md": "# Model README"
    });
    (
        StatusCode::OK,
        Json(json!({
            "content": [{"type": "text", "text": artifact_object.to_string()}]
        })),
    )
}

async fn start_model() -> (ModelState, String) {
    let state = ModelState::default();
    let app = Router::new()
        .route("/v1/messages", post(messages))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

    (state, format!("http://{addr}"))
}

// ---- hosting API stand-in ----

#[derive(Clone, Default)]
struct HostState {
    repos: Arc<Mutex<HashSet<String>>>,
    /// "{repo}/{path}" -> decoded content
    files: Arc<Mutex<HashMap<String, String>>>,
}

async fn create_repo(
    State(state): State<HostState>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let name = body["name"].as_str().unwrap_or_default().to_string();
    let mut repos = state.repos.lock().await;
    if repos.contains(&name) {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"message": "name already exists on this account"})),
        );
    }

    repos.insert(name.clone());
    (
        StatusCode::CREATED,
        Json(json!({"html_url": format!("https://github.example/{name}")})),
    )
}

async fn get_file(
    State(state): State<HostState>,
    Path((_user, repo, path)): Path<(String, String, String)>,
) -> (StatusCode, Json<Value>) {
    let files = state.files.lock().await;
    match files.get(&format!("{repo}/{path}")) {
        Some(_) => (StatusCode::OK, Json(json!({"sha": format!("sha-{path}")}))),
        None => (StatusCode::NOT_FOUND, Json(json!({"message": "Not Found"}))),
    }
}

async fn put_file(
    State(state): State<HostState>,
    Path((_user, repo, path)): Path<(String, String, String)>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let encoded = body["content"].as_str().unwrap_or_default();
    let content = String::from_utf8(B64.decode(encoded).unwrap()).unwrap();
    state
        .files
        .lock()
        .await
        .insert(format!("{repo}/{path}"), content);

    (StatusCode::CREATED, Json(json!({"content": {"path": path}})))
}

async fn branch_head(
    Path((_user, _repo, _branch)): Path<(String, String, String)>,
) -> Json<Value> {
    Json(json!({"sha": "e2e-sha"}))
}

async fn enable_pages(Path((_user, _repo)): Path<(String, String)>) -> (StatusCode, Json<Value>) {
    (StatusCode::CREATED, Json(json!({})))
}

async fn start_host() -> (HostState, String) {
    let state = HostState::default();
    let app = Router::new()
        .route("/user/repos", post(create_repo))
        .route(
            "/repos/{user}/{repo}/contents/{path}",
            get(get_file).put(put_file),
        )
        .route("/repos/{user}/{repo}/commits/{branch}", get(branch_head))
        .route("/repos/{user}/{repo}/pages", post(enable_pages))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

    (state, format!("http://{addr}"))
}

// ---- callback receiver ----

#[derive(Clone, Default)]
struct CallbackState {
    bodies: Arc<Mutex<Vec<Value>>>,
    reject: Arc<AtomicBool>,
}

async fn callback(State(state): State<CallbackState>, Json(body): Json<Value>) -> StatusCode {
    state.bodies.lock().await.push(body);
    if state.reject.load(Ordering::SeqCst) {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::OK
    }
}

async fn start_callback() -> (CallbackState, String) {
    let state = CallbackState::default();
    let app = Router::new()
        .route("/notify", post(callback))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

    (state, format!("http://{addr}/notify"))
}

// ---- helpers ----

fn test_config(model_base: &str, host_base: &str) -> Config {
    Config {
        secret: Some("s3cret".to_string()),
        anthropic_api_key: Some("key".to_string()),
        github_token: Some("token".to_string()),
        github_username: Some("octocat".to_string()),
        anthropic_api_base: model_base.to_string(),
        github_api_base: host_base.to_string(),
        ..Config::default()
    }
}

fn deploy_request(task: &str, brief: &str, callback_url: &str) -> DeployRequest {
    serde_json::from_value(json!({
        "email": "dev@example.com",
        "task": task,
        "round": 1,
        "nonce": "n-9",
        "brief": brief,
        "checks": ["has h1"],
        "evaluation_url": callback_url,
    }))
    .unwrap()
}

// ---- scenarios ----

#[tokio::test]
async fn test_accepted_request_flows_to_callback() {
    let (_model, model_base) = start_model().await;
    let (host, host_base) = start_host().await;
    let (receiver, callback_url) = start_callback().await;

    let state = Arc::new(AppState::from_config(
        test_config(&model_base, &host_base),
        reqwest::Client::new(),
    ));
    let app = build_router(state.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

    let response = reqwest::Client::new()
        .post(format!("http://{addr}/deploy"))
        .json(&json!({
            "secret": "s3cret",
            "email": "dev@example.com",
            "task": "counter app",
            "round": 1,
            "nonce": "n-9",
            "brief": "Build a counter app",
            "checks": ["has button#inc", "has span#count"],
            "evaluation_url": callback_url,
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let ack: Value = response.json().await.unwrap();
    assert_eq!(ack["status"], "accepted");

    // The ack returns before the run finishes; drain waits the run out
    state.runs.drain().await;

    let bodies = receiver.bodies.lock().await;
    assert_eq!(bodies.len(), 1);
    let payload = &bodies[0];
    assert_eq!(payload["email"], "dev@example.com");
    assert_eq!(payload["task"], "counter app");
    assert_eq!(payload["round"], 1);
    assert_eq!(payload["nonce"], "n-9");
    assert_eq!(
        payload["repo_url"],
        "https://github.example/counter-app-round1"
    );
    assert_eq!(payload["commit_sha"], "e2e-sha");
    assert_eq!(
        payload["pages_url"],
        "https://octocat.github.io/counter-app-round1/"
    );

    // What the model produced is what got published
    let files = host.files.lock().await;
    assert_eq!(
        files.get("counter-app-round1/index.html").map(String::as_str),
        Some("<html><body>model output</body></html>")
    );
    assert!(files.contains_key("counter-app-round1/LICENSE"));
}

#[tokio::test]
async fn test_wrong_secret_is_rejected_over_http() {
    let (_model, model_base) = start_model().await;
    let (host, host_base) = start_host().await;
    let (receiver, callback_url) = start_callback().await;

    let state = Arc::new(AppState::from_config(
        test_config(&model_base, &host_base),
        reqwest::Client::new(),
    ));
    let app = build_router(state.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

    let response = reqwest::Client::new()
        .post(format!("http://{addr}/deploy"))
        .json(&json!({
            "secret": "wrong",
            "email": "dev@example.com",
            "task": "demo task",
            "nonce": "n-9",
            "brief": "Build a demo",
            "evaluation_url": callback_url,
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::FORBIDDEN);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["detail"], "Invalid secret");

    // No run was spawned
    assert_eq!(state.runs.outstanding().await, 0);
    state.runs.drain().await;
    assert!(receiver.bodies.lock().await.is_empty());
    assert!(host.repos.lock().await.is_empty());
}

#[tokio::test]
async fn test_model_outage_still_publishes_fallback() {
    let (model, model_base) = start_model().await;
    model.fail.store(true, Ordering::SeqCst);
    let (host, host_base) = start_host().await;
    let (receiver, callback_url) = start_callback().await;

    let orchestrator = Orchestrator::from_config(
        &test_config(&model_base, &host_base),
        reqwest::Client::new(),
    );
    let request = deploy_request("greeting card", "Show a colorful greeting", &callback_url);

    let report = orchestrator.run(request).await.unwrap();

    assert_eq!(report.repo_url, "https://github.example/greeting-card-round1");

    // The fallback page carries the brief
    let files = host.files.lock().await;
    let index = files.get("greeting-card-round1/index.html").unwrap();
    assert!(index.contains("Show a colorful greeting"));
    assert!(index.contains("<li>has h1</li>"));

    assert_eq!(receiver.bodies.lock().await.len(), 1);
}

#[tokio::test]
async fn test_existing_repository_is_reused() {
    let (_model, model_base) = start_model().await;
    let (host, host_base) = start_host().await;
    host.repos.lock().await.insert("demo-task-round1".to_string());
    let (receiver, callback_url) = start_callback().await;

    let orchestrator = Orchestrator::from_config(
        &test_config(&model_base, &host_base),
        reqwest::Client::new(),
    );
    let request = deploy_request("demo task", "Build a demo", &callback_url);

    let report = orchestrator.run(request).await.unwrap();

    // The reuse path reports the canonical repository URL
    assert_eq!(report.repo_url, "https://github.com/octocat/demo-task-round1");
    assert_eq!(host.repos.lock().await.len(), 1);
    assert_eq!(receiver.bodies.lock().await.len(), 1);
}

#[tokio::test]
async fn test_exhausted_callback_fails_the_run() {
    let (_model, model_base) = start_model().await;
    let (_host, host_base) = start_host().await;
    let (receiver, callback_url) = start_callback().await;
    receiver.reject.store(true, Ordering::SeqCst);

    let client = reqwest::Client::new();
    let config = test_config(&model_base, &host_base);
    let orchestrator = Orchestrator::new(
        Generator::new(AnthropicClient::from_config(&config, client.clone())),
        Publisher::new(GithubClient::from_config(&config, client.clone())),
        Notifier::with_policy(
            client,
            RetryPolicy {
                max_attempts: 3,
                initial_delay_ms: 10,
                max_delay_ms: 40,
                backoff_multiplier: 2.0,
            },
            Duration::from_millis(500),
        ),
    );
    let request = deploy_request("demo task", "Build a demo", &callback_url);

    let result = orchestrator.run(request).await;

    assert!(matches!(result, Err(RunError::Notify { .. })));
    assert_eq!(receiver.bodies.lock().await.len(), 3);
}
