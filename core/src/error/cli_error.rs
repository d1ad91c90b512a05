// core/src/error/cli_error.rs
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] super::ConfigError),

    #[error(transparent)]
    Policy(#[from] super::PolicyError),

    #[error("plugin initialization failed")]
    Plugin(#[source] anyhow::Error),

    #[error("{0}")]
    Command(String),

    #[error("server error: {0}")]
    Server(String),
}
