//! Natural-language front door: classification, policy and approval creation.

mod chat;
mod classifier;
mod types;

pub use chat::ChatGateway;
pub use classifier::IntentClassifier;
pub use types::{ChatRequest, ChatResponse, Classification, ClassifierHealth, Intent};
