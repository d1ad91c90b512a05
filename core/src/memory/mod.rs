//! Bounded per-session conversation history.

use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::sync::Mutex;

use lru::LruCache;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const DEFAULT_SESSION: &str = "default";
pub const DEFAULT_MAX_SESSIONS: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Keeps the most recent `max_messages` messages per session id, for at
/// most `max_sessions` sessions.
pub struct ConversationMemory {
    max_messages: usize,
    sessions: Mutex<LruCache<String, VecDeque<ChatMessage>>>,
}

impl ConversationMemory {
    pub fn new(max_messages: usize) -> Self {
        Self::with_max_sessions(max_messages, DEFAULT_MAX_SESSIONS)
    }

    pub fn with_max_sessions(max_messages: usize, max_sessions: usize) -> Self {
        let capacity = NonZeroUsize::new(max_sessions).unwrap_or(NonZeroUsize::MIN);
        Self {
            max_messages: max_messages.max(1),
            sessions: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn max_messages(&self) -> usize {
        self.max_messages
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn history(&self, session_id: &str) -> Vec<ChatMessage> {
        match self.sessions.lock() {
            Ok(mut sessions) => sessions
                .get(session_id)
                .map(|h| h.iter().cloned().collect())
                .unwrap_or_default(),
            Err(_) => {
                warn!(session_id, "conversation memory lock poisoned, returning empty history");
                Vec::new()
            }
        }
    }

    pub fn append(&self, session_id: &str, message: ChatMessage) {
        let Ok(mut sessions) = self.sessions.lock() else {
            warn!(session_id, "conversation memory lock poisoned, dropping message");
            return;
        };
        if !sessions.contains(session_id) {
            if let Some((evicted, _)) = sessions.push(session_id.to_string(), VecDeque::new()) {
                debug!(session_id = %evicted, "evicted least recently used session");
            }
        }
        let Some(history) = sessions.get_mut(session_id) else {
            return;
        };
        history.push_back(message);
        while history.len() > self.max_messages {
            history.pop_front();
        }
        debug!(session_id, len = history.len(), "conversation memory updated");
    }

    pub fn clear(&self, session_id: &str) {
        if let Ok(mut sessions) = self.sessions.lock() {
            sessions.pop(session_id);
        }
    }
}

impl Default for ConversationMemory {
    fn default() -> Self {
        Self::new(20)
    }
}
