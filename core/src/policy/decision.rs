use serde::{Deserialize, Serialize};

/// Outcome of a policy check. Denial is a normal value, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum PolicyDecision {
    Allowed { reason: String },
    Denied { reason: String },
}

impl PolicyDecision {
    pub fn allow(reason: impl Into<String>) -> Self {
        PolicyDecision::Allowed {
            reason: reason.into(),
        }
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        PolicyDecision::Denied {
            reason: reason.into(),
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, PolicyDecision::Allowed { .. })
    }

    pub fn reason(&self) -> &str {
        match self {
            PolicyDecision::Allowed { reason } | PolicyDecision::Denied { reason } => reason,
        }
    }
}
