use async_trait::async_trait;

use super::types::{ChatRequest, Classification, ClassifierHealth};
use crate::error::ClassifierError;
use crate::memory::ChatMessage;

/// Turns a chat message into an intent, a plan and possibly a command.
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    async fn classify(
        &self,
        request: &ChatRequest,
        history: &[ChatMessage],
    ) -> Result<Classification, ClassifierError>;

    async fn health(&self) -> ClassifierHealth;
}
