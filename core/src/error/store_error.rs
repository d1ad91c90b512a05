// core/src/error/store_error.rs
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate id: {0}")]
    Duplicate(String),

    #[error("store backend failure")]
    Backend(#[source] anyhow::Error),
}
