//! Stable re-exports for consumers (`cli`, `plugins`, and external crates).
//!
//! Prefer importing from `operator_core::api` instead of reaching into internal modules.

pub use crate::approval::{
    Approval, ApprovalService, ApprovalStatus, ApprovalStore, InMemoryApprovalStore, Run,
    StatusTransition,
};
pub use crate::config::{
    AppConfig, ExecutorConfig, LlmConfig, LoggingConfig, MemoryConfig, PolicyConfig, PolicyMode,
    ServerConfig, DEFAULT_LLM_MODEL,
};
pub use crate::context::{AppContext, Services, ServicesFactory};
pub use crate::error::{
    ApprovalError, ClassifierError, CliError, ConfigError, PolicyError, StoreError,
};
pub use crate::executor::{CommandExecutor, ExecutionResult, ShellExecutor};
pub use crate::gateway::{
    ChatGateway, ChatRequest, ChatResponse, Classification, ClassifierHealth, Intent,
    IntentClassifier,
};
pub use crate::memory::{ChatMessage, ConversationMemory, Role};
pub use crate::policy::{PolicyDecision, PolicyEngine};
