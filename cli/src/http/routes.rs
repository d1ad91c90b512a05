//! HTTP route handlers

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use chrono::Local;
use operator_core::api::{Approval, ChatRequest, ChatResponse, Run};
use tracing::info;
use uuid::Uuid;

use crate::http::{
    error::HttpServerError,
    models::{ExecutionResponse, HealthResponse},
    state::AppState,
};

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/chat", post(chat_handler))
        .route("/approvals/:id", get(get_approval_handler))
        .route("/approvals/:id/execute", post(execute_handler))
        .route("/approvals/:id/reject", post(reject_handler))
        .route("/runs/:id", get(get_run_handler))
        .route("/api/v1/shutdown", post(shutdown_handler))
        .with_state(state)
}

/// Unparseable ids can never name a record, so they read as not found.
fn parse_id(raw: &str, not_found: &str) -> Result<Uuid, HttpServerError> {
    Uuid::parse_str(raw).map_err(|_| HttpServerError::NotFound(not_found.to_string()))
}

fn approval_id(raw: &str) -> Result<Uuid, HttpServerError> {
    parse_id(raw, "Approval ID not found.")
}

/// GET /
async fn root_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Welcome to the operator API."
    }))
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    state.record_request("/health");
    let llm = state.classifier.health().await;
    let (uptime_seconds, requests_handled) = state
        .stats
        .read()
        .map(|s| (s.uptime_seconds(), s.requests_total))
        .unwrap_or_default();

    Json(HealthResponse {
        status: "ok".into(),
        llm_status: llm.llm_status,
        llm_message: llm.llm_message,
        model: llm.model,
        fallback_used: llm.fallback_used,
        session_id: state.session_id.clone(),
        uptime_seconds,
        requests_handled,
        timestamp: Local::now().to_rfc3339(),
    })
}

/// POST /chat
async fn chat_handler(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Json<ChatResponse> {
    state.record_request("/chat");
    Json(state.gateway.handle(req).await)
}

/// GET /approvals/:id
async fn get_approval_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Approval>, HttpServerError> {
    state.record_request("/approvals/:id");
    let id = approval_id(&id)?;
    Ok(Json(state.approvals.get(id).await?))
}

/// POST /approvals/:id/execute
async fn execute_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ExecutionResponse>, HttpServerError> {
    state.record_request("/approvals/:id/execute");
    let id = approval_id(&id)?;
    match state.approvals.execute(id).await {
        Ok(run) => {
            info!(approval_id = %id, run_id = %run.id, ok = run.ok, "approval executed");
            Ok(Json(run.into()))
        }
        Err(e) => {
            state.record_error();
            Err(e.into())
        }
    }
}

/// POST /approvals/:id/reject
async fn reject_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Approval>, HttpServerError> {
    state.record_request("/approvals/:id/reject");
    let id = approval_id(&id)?;
    state.approvals.reject(id).await.map(Json).map_err(|e| {
        state.record_error();
        HttpServerError::from(e)
    })
}

/// GET /runs/:id
async fn get_run_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Run>, HttpServerError> {
    state.record_request("/runs/:id");
    let id = parse_id(&id, "Run ID not found.")?;
    Ok(Json(state.approvals.get_run(id).await?))
}

/// POST /api/v1/shutdown
async fn shutdown_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    let _ = state.shutdown_tx.send(());

    Json(serde_json::json!({
        "success": true,
        "message": "Shutdown signal sent"
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request, StatusCode};
    use operator_core::api::{
        AppConfig, AppContext, ChatMessage, Classification, ClassifierError, ClassifierHealth,
        InMemoryApprovalStore, Intent, IntentClassifier, PolicyConfig, Services, ShellExecutor,
    };
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tempfile::TempDir;
    use tokio::sync::broadcast;
    use tower::ServiceExt;

    struct FixedClassifier {
        command: &'static str,
    }

    #[async_trait]
    impl IntentClassifier for FixedClassifier {
        async fn classify(
            &self,
            _request: &ChatRequest,
            _history: &[ChatMessage],
        ) -> Result<Classification, ClassifierError> {
            Ok(Classification {
                intent: Some(Intent::SystemTask),
                plan: vec!["Propose command.".into()],
                proposed_command: Some(self.command.to_string()),
                response: None,
            })
        }

        async fn health(&self) -> ClassifierHealth {
            ClassifierHealth::ok("fixed", "fixed classifier", false)
        }
    }

    fn create_test_state(dir: &TempDir, command: &'static str) -> AppState {
        let sandbox = dir.path().join("sandbox");
        std::fs::create_dir_all(&sandbox).unwrap();
        std::fs::write(sandbox.join("dummy_file.txt"), "test content").unwrap();

        let cfg = AppConfig {
            policy: PolicyConfig::with_sandbox_root(&sandbox),
            ..AppConfig::default()
        };
        let ctx = AppContext::new(cfg).unwrap();
        let classifier: Arc<dyn IntentClassifier> = Arc::new(FixedClassifier { command });
        let services = Services {
            classifier: classifier.clone(),
            store: Arc::new(InMemoryApprovalStore::new()),
            executor: Arc::new(ShellExecutor::new(8000)),
        };
        let (gateway, approvals) = ctx.wire(&services);
        let (shutdown_tx, _) = broadcast::channel(1);
        AppState::new("test-session".into(), gateway, approvals, classifier, shutdown_tx)
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(v) => {
                builder = builder.header("content-type", "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };
        let response = app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_chat_approve_execute_once() {
        let dir = TempDir::new().unwrap();
        let app = create_router(create_test_state(&dir, "ls"));

        let (status, chat) = send(
            &app,
            Method::POST,
            "/chat",
            Some(json!({ "message": "list the files" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(chat["requires_approval"], true);
        assert_eq!(chat["proposed_command"], "ls");
        let approval_id = chat["approval_id"].as_str().unwrap().to_string();

        let (status, approval) = send(&app, Method::GET, &format!("/approvals/{approval_id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(approval["status"], "pending");

        let uri = format!("/approvals/{approval_id}/execute");
        let (status, first) = send(&app, Method::POST, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["ok"], true);
        assert_eq!(first["returncode"], 0);
        assert!(first["stdout"].as_str().unwrap().contains("dummy_file.txt"));

        let (status, second) = send(&app, Method::POST, &uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(second["detail"]
            .as_str()
            .unwrap()
            .contains("already been processed"));

        let run_id = first["run_id"].as_str().unwrap();
        let (status, run) = send(&app, Method::GET, &format!("/runs/{run_id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(run["approval_id"], approval_id.as_str());
        assert_eq!(run["command"], "ls");
    }

    #[tokio::test]
    async fn test_denied_command_creates_no_approval() {
        let dir = TempDir::new().unwrap();
        let app = create_router(create_test_state(&dir, "rm -rf /"));

        let (status, chat) = send(
            &app,
            Method::POST,
            "/chat",
            Some(json!({ "message": "delete everything" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(chat["requires_approval"], false);
        assert!(chat["approval_id"].is_null());
        assert!(chat["response"]
            .as_str()
            .unwrap()
            .starts_with("I cannot execute this command. Reason:"));
    }

    #[tokio::test]
    async fn test_reject_then_execute_is_bad_request() {
        let dir = TempDir::new().unwrap();
        let app = create_router(create_test_state(&dir, "git status"));

        let (_, chat) = send(&app, Method::POST, "/chat", Some(json!({ "message": "status" }))).await;
        let approval_id = chat["approval_id"].as_str().unwrap().to_string();

        let (status, rejected) = send(
            &app,
            Method::POST,
            &format!("/approvals/{approval_id}/reject"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(rejected["status"], "rejected");

        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/approvals/{approval_id}/execute"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["detail"],
            "This approval request has already been processed with status: 'rejected'."
        );
    }

    #[tokio::test]
    async fn test_unknown_ids_are_not_found() {
        let dir = TempDir::new().unwrap();
        let app = create_router(create_test_state(&dir, "ls"));

        let missing = Uuid::new_v4();
        let (status, body) = send(&app, Method::POST, &format!("/approvals/{missing}/execute"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "Approval ID not found.");

        let (status, _) = send(&app, Method::POST, "/approvals/not-a-uuid/execute", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(&app, Method::GET, &format!("/runs/{missing}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "Run ID not found.");
    }

    #[tokio::test]
    async fn test_health_handler() {
        let dir = TempDir::new().unwrap();
        let state = create_test_state(&dir, "ls");
        let response = health_handler(State(state.clone())).await;

        assert_eq!(response.0.status, "ok");
        assert_eq!(response.0.llm_status, "ok");
        assert_eq!(response.0.model.as_deref(), Some("fixed"));
        assert_eq!(response.0.session_id, "test-session");
        assert_eq!(state.stats.read().unwrap().requests_total, 1);
    }

    #[tokio::test]
    async fn test_shutdown_handler() {
        let dir = TempDir::new().unwrap();
        let state = create_test_state(&dir, "ls");
        let mut shutdown_rx = state.shutdown_tx.subscribe();

        let response = shutdown_handler(State(state)).await;
        assert_eq!(response.0["success"], true);
        assert!(shutdown_rx.try_recv().is_ok());
    }
}
