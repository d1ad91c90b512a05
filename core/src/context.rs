use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::approval::{ApprovalService, ApprovalStore};
use crate::config::AppConfig;
use crate::error::{CliError, PolicyError};
use crate::executor::CommandExecutor;
use crate::gateway::{ChatGateway, IntentClassifier};
use crate::memory::ConversationMemory;
use crate::policy::PolicyEngine;

/// Pluggable collaborators built from configuration.
pub struct Services {
    pub classifier: Arc<dyn IntentClassifier>,
    pub store: Arc<dyn ApprovalStore>,
    pub executor: Arc<dyn CommandExecutor>,
}

pub trait ServicesFactory: Send + Sync {
    fn build_services(&self, cfg: &AppConfig) -> Result<Services, CliError>;
}

/// Configuration plus the pieces that only depend on it.
#[derive(Clone)]
pub struct AppContext {
    cfg: AppConfig,
    policy: Arc<PolicyEngine>,
    memory: Arc<ConversationMemory>,
}

impl AppContext {
    pub fn new(cfg: AppConfig) -> Result<Self, PolicyError> {
        let policy = Arc::new(PolicyEngine::new(&cfg.policy)?);
        let memory = Arc::new(ConversationMemory::with_max_sessions(
            cfg.memory.max_messages,
            cfg.memory.max_sessions,
        ));
        Ok(Self {
            cfg,
            policy,
            memory,
        })
    }

    pub fn cfg(&self) -> &AppConfig {
        &self.cfg
    }

    pub fn policy(&self) -> Arc<PolicyEngine> {
        self.policy.clone()
    }

    pub fn memory(&self) -> Arc<ConversationMemory> {
        self.memory.clone()
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.cfg.executor.timeout_secs)
    }

    /// Wires services into the approval state machine and chat gateway.
    pub fn wire(&self, services: &Services) -> (ChatGateway, ApprovalService) {
        let approvals = ApprovalService::new(
            services.store.clone(),
            services.executor.clone(),
            self.command_timeout(),
        );
        let gateway = ChatGateway::new(
            services.classifier.clone(),
            self.policy(),
            approvals.clone(),
            self.memory(),
        );
        info!(
            sandbox_root = %self.policy.sandbox_root().display(),
            mode = %self.policy.mode(),
            timeout_secs = self.cfg.executor.timeout_secs,
            "gateway wired"
        );
        (gateway, approvals)
    }
}
