//! Sandboxed command execution.
//!
//! The executor never returns an error: every failure mode (empty command,
//! missing directory, timeout, spawn failure) becomes an [`ExecutionResult`]
//! with `ok == false` so it can be recorded as a run like any other outcome.

mod expand;
mod output;
mod shell;

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use expand::{expand_env_vars, expand_with};
pub use output::{truncate_tail, TRUNCATION_MARKER};
pub use shell::ShellExecutor;

/// Return code reported when the process never produced an exit code.
pub const NOT_STARTED: i32 = -1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub returncode: i32,
    pub stdout: String,
    pub stderr: String,
    pub ok: bool,
}

impl ExecutionResult {
    pub fn completed(returncode: i32, stdout: String, stderr: String) -> Self {
        Self {
            returncode,
            stdout,
            stderr,
            ok: returncode == 0,
        }
    }

    /// Synthetic result for an invocation that produced no exit code.
    pub fn failure(stderr: impl Into<String>) -> Self {
        Self {
            returncode: NOT_STARTED,
            stdout: String::new(),
            stderr: stderr.into(),
            ok: false,
        }
    }
}

#[async_trait]
pub trait CommandExecutor: Send + Sync {
    async fn execute(&self, command: &str, cwd: &Path, timeout: Duration) -> ExecutionResult;
}
