//! Request and response bodies that are specific to the HTTP surface.

use operator_core::api::Run;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct ExecutionResponse {
    pub run_id: Uuid,
    pub ok: bool,
    pub stdout: String,
    pub stderr: String,
    pub returncode: i32,
}

impl From<Run> for ExecutionResponse {
    fn from(run: Run) -> Self {
        Self {
            run_id: run.id,
            ok: run.ok,
            stdout: run.stdout,
            stderr: run.stderr,
            returncode: run.returncode,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub llm_status: String,
    pub llm_message: String,
    pub model: Option<String>,
    pub fallback_used: bool,
    pub session_id: String,
    pub uptime_seconds: f64,
    pub requests_handled: u64,
    pub timestamp: String,
}
