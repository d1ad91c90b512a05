use std::sync::Arc;

use async_trait::async_trait;
use operator_core::api::{
    ChatMessage, ChatRequest, Classification, ClassifierError, ClassifierHealth, Intent,
    IntentClassifier, Role,
};
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::prompt::SYSTEM_PROMPT;
use crate::llm::{OllamaClient, OllamaMessage};

const PARSE_FAILED_PLAN: &str =
    "Failed to parse LLM response. Please try again or rephrase your request.";

#[derive(Debug, Deserialize)]
struct RawClassification {
    intent: Intent,
    #[serde(default)]
    plan: Vec<String>,
    #[serde(default)]
    proposed_command: Option<String>,
    #[serde(default)]
    response: Option<String>,
}

/// Classifies messages by asking a local model for a JSON verdict.
pub struct LlmIntentRouter {
    client: Arc<OllamaClient>,
}

impl LlmIntentRouter {
    pub fn new(client: Arc<OllamaClient>) -> Self {
        Self { client }
    }

    fn build_messages(request: &ChatRequest, history: &[ChatMessage]) -> Vec<OllamaMessage> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(OllamaMessage::new("system", SYSTEM_PROMPT));
        for m in history {
            let role = match m.role {
                Role::User => "user",
                Role::Assistant => "assistant",
            };
            messages.push(OllamaMessage::new(role, m.content.clone()));
        }
        let mut content = format!("User: {}", request.message);
        if let Some(cwd) = request.cwd.as_deref().filter(|c| !c.trim().is_empty()) {
            content.push_str(&format!("\nCurrent Working Directory: {cwd}"));
        }
        messages.push(OllamaMessage::new("user", content));
        messages
    }
}

/// Pulls the JSON object out of a model reply, tolerating code fences and
/// surrounding prose.
fn extract_json(raw: &str) -> &str {
    let trimmed = raw.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.trim_end().strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed);
    match (unfenced.find('{'), unfenced.rfind('}')) {
        (Some(start), Some(end)) if start < end => &unfenced[start..=end],
        _ => unfenced,
    }
}

pub fn parse_classification(raw: &str) -> Classification {
    match serde_json::from_str::<RawClassification>(extract_json(raw)) {
        Ok(parsed) => Classification {
            intent: Some(parsed.intent),
            plan: parsed.plan,
            proposed_command: parsed.proposed_command.filter(|c| !c.trim().is_empty()),
            response: parsed.response,
        },
        Err(e) => {
            warn!(error = %e, raw = %raw, "failed to parse LLM response as JSON");
            Classification {
                intent: Some(Intent::Chat),
                plan: vec![PARSE_FAILED_PLAN.to_string()],
                proposed_command: None,
                response: None,
            }
        }
    }
}

#[async_trait]
impl IntentClassifier for LlmIntentRouter {
    async fn classify(
        &self,
        request: &ChatRequest,
        history: &[ChatMessage],
    ) -> Result<Classification, ClassifierError> {
        let messages = Self::build_messages(request, history);
        let raw = self.client.chat(&messages).await?;
        debug!(raw = %raw, "LLM raw response");
        let classification = parse_classification(&raw);
        info!(
            intent = classification.intent().as_str(),
            proposed_command = ?classification.proposed_command,
            "LLM classified intent"
        );
        Ok(classification)
    }

    async fn health(&self) -> ClassifierHealth {
        let detection = self.client.detection(true).await;
        if !detection.ollama_up {
            return ClassifierHealth::unavailable(detection.reason);
        }
        match detection.selected_model {
            Some(model) => ClassifierHealth::ok(model, detection.reason, detection.fallback_used),
            None => ClassifierHealth {
                llm_status: "model_unavailable".to_string(),
                llm_message: detection.reason,
                model: None,
                fallback_used: false,
            },
        }
    }
}
