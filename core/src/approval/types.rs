use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::executor::ExecutionResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    Pending,
    Executed,
    Rejected,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "pending",
            ApprovalStatus::Executed => "executed",
            ApprovalStatus::Rejected => "rejected",
        }
    }

    /// Terminal statuses never transition again.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ApprovalStatus::Pending)
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A command that passed policy and is waiting for a human decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Approval {
    pub id: Uuid,
    pub message: String,
    pub proposed_command: String,
    pub cwd: PathBuf,
    pub status: ApprovalStatus,
    pub created_at: DateTime<Utc>,
}

impl Approval {
    pub fn new(
        message: impl Into<String>,
        proposed_command: impl Into<String>,
        cwd: impl Into<PathBuf>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            message: message.into(),
            proposed_command: proposed_command.into(),
            cwd: cwd.into(),
            status: ApprovalStatus::Pending,
            created_at: Utc::now(),
        }
    }
}

/// The recorded outcome of executing an approval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub id: Uuid,
    pub approval_id: Uuid,
    pub command: String,
    pub cwd: PathBuf,
    pub returncode: i32,
    pub ok: bool,
    pub stdout: String,
    pub stderr: String,
    pub created_at: DateTime<Utc>,
}

impl Run {
    pub fn record(approval: &Approval, result: ExecutionResult) -> Self {
        Self {
            id: Uuid::new_v4(),
            approval_id: approval.id,
            command: approval.proposed_command.clone(),
            cwd: approval.cwd.clone(),
            returncode: result.returncode,
            ok: result.ok,
            stdout: result.stdout,
            stderr: result.stderr,
            created_at: Utc::now(),
        }
    }
}
