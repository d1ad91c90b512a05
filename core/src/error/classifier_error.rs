// core/src/error/classifier_error.rs
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("language model unreachable: {0}")]
    Unavailable(String),

    #[error("no suitable language model available: {0}")]
    ModelUnavailable(String),

    #[error("classifier failure")]
    Other(#[source] anyhow::Error),
}
