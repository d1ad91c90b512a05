use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Chat,
    CodeHelp,
    SystemTask,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Chat => "chat",
            Intent::CodeHelp => "code_help",
            Intent::SystemTask => "system_task",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub cwd: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cwd: None,
            session_id: None,
        }
    }

    pub fn with_cwd(mut self, cwd: impl Into<String>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub intent: Intent,
    #[serde(default)]
    pub plan: Vec<String>,
    #[serde(default)]
    pub requires_approval: bool,
    #[serde(default)]
    pub approval_id: Option<Uuid>,
    #[serde(default)]
    pub proposed_command: Option<String>,
    pub response: String,
}

impl ChatResponse {
    pub fn reply(intent: Intent, plan: Vec<String>, response: impl Into<String>) -> Self {
        Self {
            intent,
            plan,
            requires_approval: false,
            approval_id: None,
            proposed_command: None,
            response: response.into(),
        }
    }
}

/// What the classifier made of a message.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Classification {
    pub intent: Option<Intent>,
    #[serde(default)]
    pub plan: Vec<String>,
    #[serde(default)]
    pub proposed_command: Option<String>,
    #[serde(default)]
    pub response: Option<String>,
}

impl Classification {
    pub fn intent(&self) -> Intent {
        self.intent.unwrap_or(Intent::Chat)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierHealth {
    pub llm_status: String,
    pub llm_message: String,
    pub model: Option<String>,
    pub fallback_used: bool,
}

impl ClassifierHealth {
    pub fn ok(model: impl Into<String>, message: impl Into<String>, fallback_used: bool) -> Self {
        Self {
            llm_status: "ok".into(),
            llm_message: message.into(),
            model: Some(model.into()),
            fallback_used,
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            llm_status: "unavailable".into(),
            llm_message: message.into(),
            model: None,
            fallback_used: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_wire_names() {
        assert_eq!(serde_json::to_string(&Intent::SystemTask).unwrap(), "\"system_task\"");
        let parsed: Intent = serde_json::from_str("\"code_help\"").unwrap();
        assert_eq!(parsed, Intent::CodeHelp);
    }

    #[test]
    fn test_chat_request_optional_fields() {
        let req: ChatRequest = serde_json::from_str(r#"{"message":"hi"}"#).unwrap();
        assert_eq!(req.message, "hi");
        assert!(req.cwd.is_none());
        assert!(req.session_id.is_none());
    }
}
