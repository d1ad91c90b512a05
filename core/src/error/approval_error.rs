// core/src/error/approval_error.rs
use thiserror::Error;

use crate::approval::ApprovalStatus;

#[derive(Debug, Error)]
pub enum ApprovalError {
    #[error("Approval ID not found.")]
    NotFound,

    #[error("This approval request has already been processed with status: '{status}'.")]
    Conflict { status: ApprovalStatus },

    #[error("Run ID not found.")]
    RunNotFound,

    #[error("execution task failed: {0}")]
    Execution(String),

    #[error("approval store error: {0}")]
    Store(#[from] super::StoreError),
}
