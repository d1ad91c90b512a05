mod approval_error;
mod classifier_error;
mod cli_error;
mod config_error;
mod policy_error;
mod store_error;

pub use approval_error::ApprovalError;
pub use classifier_error::ClassifierError;
pub use cli_error::CliError;
pub use config_error::ConfigError;
pub use policy_error::PolicyError;
pub use store_error::StoreError;
