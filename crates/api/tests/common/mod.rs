#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use folio_core::optimization::OptimizationInputs;
use folio_core::types::TaskId;
use folio_worker::engine::JobManager;
use folio_worker::logs::{log_lines, InMemoryLogStore, TaskLogStore};
use folio_worker::sandbox::{ExecutionSandbox, RunResult, SandboxOutcome};
use http_body_util::BodyExt;
use tokio::sync::Notify;
use tower::ServiceExt;

use folio_api::config::ServerConfig;
use folio_api::router::build_app_router;
use folio_api::state::AppState;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
    }
}

/// Stand-in solver: waits for a release signal, then returns uniform
/// weights (or fails when the target is negative) and stores a short log.
pub struct ScriptedSandbox {
    release: Arc<Notify>,
    logs: Arc<InMemoryLogStore>,
}

#[async_trait]
impl ExecutionSandbox for ScriptedSandbox {
    async fn run(&self, task_id: TaskId, inputs: OptimizationInputs) -> SandboxOutcome {
        self.release.notified().await;

        let logs = log_lines("Starting minimum-variance optimization");
        self.logs.write(task_id, &logs).await.expect("store log");

        let n = inputs.n_assets();
        let result = if inputs.target < 0.0 {
            RunResult::Failed {
                error: "solver failed (Infeasible): target return is unreachable".into(),
            }
        } else {
            RunResult::Completed {
                weights: vec![1.0 / n as f64; n],
            }
        };

        SandboxOutcome {
            result,
            logs,
            log_error: None,
        }
    }
}

/// Application under test plus the handle that lets its solver finish.
pub struct TestApp {
    pub router: Router,
    pub jobs: JobManager,
    pub release: Arc<Notify>,
}

impl TestApp {
    /// Let the running task finish.
    pub fn finish_running(&self) {
        self.release.notify_one();
    }
}

/// Build the full application router with a scripted sandbox and an
/// in-memory log store.
pub fn build_test_app() -> TestApp {
    let config = test_config();
    let release = Arc::new(Notify::new());
    let logs = Arc::new(InMemoryLogStore::new());
    let sandbox = ScriptedSandbox {
        release: Arc::clone(&release),
        logs: Arc::clone(&logs),
    };
    let jobs = JobManager::new(Arc::new(sandbox), logs);

    let state = AppState {
        config: Arc::new(config.clone()),
        jobs: jobs.clone(),
    };

    TestApp {
        router: build_app_router(state, &config),
        jobs,
        release,
    }
}

/// Send a GET request.
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Send a POST request with a JSON body.
pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    post_raw(app, uri, body.to_string()).await
}

/// Send a POST request with a raw body labelled as JSON.
pub async fn post_raw(app: Router, uri: &str, body: String) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
