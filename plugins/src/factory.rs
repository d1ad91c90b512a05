use std::sync::Arc;

use anyhow::Result;
use operator_core::api::{
    AppConfig, ApprovalStore, CommandExecutor, InMemoryApprovalStore, IntentClassifier,
    ShellExecutor,
};

use crate::llm::OllamaClient;
use crate::router::LlmIntentRouter;

pub fn build_classifier(cfg: &AppConfig) -> Result<Arc<dyn IntentClassifier>> {
    let client = OllamaClient::new(&cfg.llm)?;
    Ok(Arc::new(LlmIntentRouter::new(Arc::new(client))))
}

pub fn build_store(_cfg: &AppConfig) -> Arc<dyn ApprovalStore> {
    Arc::new(InMemoryApprovalStore::new())
}

pub fn build_executor(cfg: &AppConfig) -> Arc<dyn CommandExecutor> {
    Arc::new(ShellExecutor::from_config(&cfg.executor))
}
