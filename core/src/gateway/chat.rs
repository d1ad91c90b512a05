use std::sync::Arc;

use tracing::{error, info, warn};

use super::classifier::IntentClassifier;
use super::types::{ChatRequest, ChatResponse, Intent};
use crate::approval::ApprovalService;
use crate::error::ClassifierError;
use crate::memory::{ChatMessage, ConversationMemory, DEFAULT_SESSION};
use crate::policy::{resolve_path, PolicyDecision, PolicyEngine};

const MSG_LLM_UNREACHABLE: &str = "I'm sorry, I cannot connect to the local LLM at the moment. Please ensure Ollama is running and the model is pulled.";
const MSG_MODEL_MISSING: &str = "I'm sorry, the required Ollama model is not installed. Please run: ollama pull gpt-oss:20b";
const MSG_UNEXPECTED: &str =
    "I'm sorry, an unexpected error occurred while processing your request.";
const MSG_NO_COMMAND: &str = "I identified a system task, but the LLM couldn't determine the specific command. Please be more explicit, for example: 'run git status'.";

/// Entry point for `/chat`: classify, police, and queue commands for approval.
pub struct ChatGateway {
    classifier: Arc<dyn IntentClassifier>,
    policy: Arc<PolicyEngine>,
    approvals: ApprovalService,
    memory: Arc<ConversationMemory>,
}

impl ChatGateway {
    pub fn new(
        classifier: Arc<dyn IntentClassifier>,
        policy: Arc<PolicyEngine>,
        approvals: ApprovalService,
        memory: Arc<ConversationMemory>,
    ) -> Self {
        Self {
            classifier,
            policy,
            approvals,
            memory,
        }
    }

    pub async fn handle(&self, request: ChatRequest) -> ChatResponse {
        let session_id = request
            .session_id
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SESSION.to_string());
        let history = self.memory.history(&session_id);

        let classification = match self.classifier.classify(&request, &history).await {
            Ok(c) => c,
            Err(e) => return classifier_failure(e),
        };
        let intent = classification.intent();
        let plan = classification.plan;
        info!(
            session_id = %session_id,
            intent = intent.as_str(),
            proposed_command = ?classification.proposed_command,
            "message classified"
        );

        if intent == Intent::SystemTask {
            let command = classification
                .proposed_command
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty());
            return match command {
                Some(command) => self.propose(&request, intent, plan, command).await,
                None => ChatResponse::reply(intent, plan, MSG_NO_COMMAND),
            };
        }

        let text = classification
            .response
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| fallback_text(intent, &request.message, &plan));
        self.memory
            .append(&session_id, ChatMessage::user(request.message.clone()));
        self.memory
            .append(&session_id, ChatMessage::assistant(text.clone()));
        ChatResponse::reply(intent, plan, text)
    }

    async fn propose(
        &self,
        request: &ChatRequest,
        intent: Intent,
        plan: Vec<String>,
        command: String,
    ) -> ChatResponse {
        let cwd = self
            .policy
            .resolve_cwd(request.cwd.as_deref())
            .unwrap_or_else(|| self.policy.sandbox_root().to_path_buf());

        if let PolicyDecision::Denied { reason } = self.policy.check_all(&command, Some(&cwd)) {
            warn!(command = %command, cwd = %cwd.display(), reason = %reason, "proposed command denied");
            return ChatResponse::reply(
                intent,
                plan,
                format!("I cannot execute this command. Reason: {reason}"),
            );
        }

        // symlinks in the approved cwd are resolved once, here
        let execution_cwd = resolve_path(&cwd).unwrap_or(cwd);
        match self
            .approvals
            .create(&request.message, &command, execution_cwd)
            .await
        {
            Ok(approval) => ChatResponse {
                intent,
                plan,
                requires_approval: true,
                approval_id: Some(approval.id),
                proposed_command: Some(command.clone()),
                response: format!(
                    "I can do that. To proceed with the command '{command}', please confirm by executing the approval request."
                ),
            },
            Err(e) => {
                error!(command = %command, error = %e, "failed to create approval");
                ChatResponse::reply(Intent::Chat, vec!["An unexpected error occurred.".into()], MSG_UNEXPECTED)
            }
        }
    }
}

fn classifier_failure(err: ClassifierError) -> ChatResponse {
    let (plan, text) = match &err {
        ClassifierError::Unavailable(_) => ("Failed to connect to LLM.", MSG_LLM_UNREACHABLE),
        ClassifierError::ModelUnavailable(_) => ("LLM model is unavailable.", MSG_MODEL_MISSING),
        ClassifierError::Other(_) => ("An unexpected error occurred.", MSG_UNEXPECTED),
    };
    error!(error = %err, "intent classification failed");
    ChatResponse::reply(Intent::Chat, vec![plan.to_string()], text)
}

fn fallback_text(intent: Intent, message: &str, plan: &[String]) -> String {
    let kind = match intent {
        Intent::CodeHelp => "This is the response for code help",
        _ => "This is a general chat response from the LLM",
    };
    format!(
        "{kind}, based on your request: '{message}'. Plan: {}",
        plan.join(", ")
    )
}
