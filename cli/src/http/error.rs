use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use operator_core::api::ApprovalError;
use thiserror::Error;
use tracing::error;

/// Handler failures, rendered as `{"detail": ...}`.
#[derive(Debug, Error)]
pub enum HttpServerError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Internal(String),
}

impl HttpServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            HttpServerError::NotFound(_) => StatusCode::NOT_FOUND,
            HttpServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            HttpServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ApprovalError> for HttpServerError {
    fn from(err: ApprovalError) -> Self {
        match err {
            ApprovalError::NotFound | ApprovalError::RunNotFound => {
                HttpServerError::NotFound(err.to_string())
            }
            ApprovalError::Conflict { .. } => HttpServerError::BadRequest(err.to_string()),
            ApprovalError::Store(e) => {
                error!(error = ?e, "approval store failure");
                HttpServerError::Internal("Internal server error.".into())
            }
            ApprovalError::Execution(e) => {
                error!(error = %e, "approved command could not be executed");
                HttpServerError::Internal("Internal server error.".into())
            }
        }
    }
}

impl IntoResponse for HttpServerError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "detail": self.to_string() }));
        (self.status(), body).into_response()
    }
}
