// core/src/error/policy_error.rs
use thiserror::Error;

/// Raised only while building a policy engine; decisions themselves never fail.
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("policy config invalid: {0}")]
    InvalidConfig(String),

    #[error("invalid sandbox root: {path}")]
    SandboxRoot { path: String, #[source] source: std::io::Error },

    #[error("disallowed pattern does not compile: {pattern}")]
    Pattern { pattern: String, #[source] source: regex::Error },
}
