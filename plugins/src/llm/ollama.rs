//! Minimal Ollama HTTP client: model detection and non-streaming chat.

use std::time::Duration;

use operator_core::api::{ClassifierError, LlmConfig, DEFAULT_LLM_MODEL};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, error, info};

const NO_MODEL: &str =
    "No suitable Ollama model is available. Please pull 'gpt-oss:20b' or configure OLLAMA_MODEL.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OllamaMessage {
    #[serde(default)]
    pub role: String,
    pub content: String,
}

impl OllamaMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// Outcome of probing `/api/tags`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDetection {
    pub ollama_up: bool,
    pub model_available: bool,
    pub selected_model: Option<String>,
    pub reason: String,
    pub fallback_used: bool,
}

impl ModelDetection {
    fn down(reason: String) -> Self {
        Self {
            ollama_up: false,
            model_available: false,
            selected_model: None,
            reason,
            fallback_used: false,
        }
    }
}

#[derive(Serialize)]
struct ChatPayload<'a> {
    model: &'a str,
    messages: &'a [OllamaMessage],
    stream: bool,
    options: ChatOptions,
}

#[derive(Serialize)]
struct ChatOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatReply {
    message: Option<OllamaMessage>,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelEntry>,
}

#[derive(Deserialize)]
struct ModelEntry {
    name: String,
}

pub struct OllamaClient {
    http: Client,
    base_url: String,
    timeout_secs: u64,
    temperature: f32,
    preferred_model: Option<String>,
    fallback_model: String,
    detection: RwLock<Option<ModelDetection>>,
}

impl OllamaClient {
    pub fn new(cfg: &LlmConfig) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            timeout_secs: cfg.timeout_secs,
            temperature: cfg.temperature,
            preferred_model: cfg.model.clone().filter(|m| !m.trim().is_empty()),
            fallback_model: cfg.fallback_model.clone(),
            detection: RwLock::new(None),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn select_model(&self, available: &[String]) -> (Option<String>, bool, String) {
        let has = |name: &str| available.iter().any(|m| m == name);
        if let Some(preferred) = self.preferred_model.as_deref().filter(|m| has(m)) {
            return (
                Some(preferred.to_string()),
                false,
                format!("Using configured model '{preferred}'."),
            );
        }
        if has(DEFAULT_LLM_MODEL) {
            return (
                Some(DEFAULT_LLM_MODEL.to_string()),
                false,
                format!("Using default model '{DEFAULT_LLM_MODEL}'."),
            );
        }
        if has(&self.fallback_model) {
            return (
                Some(self.fallback_model.clone()),
                true,
                format!("Using fallback model '{}'.", self.fallback_model),
            );
        }
        (
            None,
            false,
            "Ollama is running but no preferred models are installed. Install 'gpt-oss:20b' or a fallback model."
                .to_string(),
        )
    }

    /// Probes the server and picks a model: configured, then default, then fallback.
    pub async fn detect(&self) -> ModelDetection {
        let tags: TagsResponse = match self.request(self.http.get(self.url("/api/tags"))).await {
            Ok(tags) => tags,
            Err(ClassifierError::Unavailable(reason)) => return ModelDetection::down(reason),
            Err(e) => return ModelDetection::down(e.to_string()),
        };
        let available: Vec<String> = tags.models.into_iter().map(|m| m.name).collect();
        let (selected_model, fallback_used, reason) = self.select_model(&available);
        ModelDetection {
            ollama_up: true,
            model_available: selected_model.is_some(),
            selected_model,
            reason,
            fallback_used,
        }
    }

    pub async fn refresh_detection(&self) -> ModelDetection {
        let detection = self.detect().await;
        info!(
            ollama_up = detection.ollama_up,
            model_available = detection.model_available,
            selected_model = ?detection.selected_model,
            fallback_used = detection.fallback_used,
            reason = %detection.reason,
            "ollama model detection"
        );
        *self.detection.write().await = Some(detection.clone());
        detection
    }

    /// Cached detection; probes when nothing is cached or `refresh` is set.
    pub async fn detection(&self, refresh: bool) -> ModelDetection {
        if !refresh {
            if let Some(cached) = self.detection.read().await.clone() {
                return cached;
            }
        }
        self.refresh_detection().await
    }

    async fn selected_model(&self) -> Result<String, ClassifierError> {
        let cached = self
            .detection
            .read()
            .await
            .as_ref()
            .and_then(|d| d.selected_model.clone());
        if let Some(model) = cached {
            return Ok(model);
        }
        info!("no ollama model cached, refreshing detection before chat");
        let detection = self.refresh_detection().await;
        if !detection.ollama_up {
            return Err(ClassifierError::Unavailable(detection.reason));
        }
        detection
            .selected_model
            .ok_or_else(|| ClassifierError::ModelUnavailable(NO_MODEL.to_string()))
    }

    pub async fn chat(&self, messages: &[OllamaMessage]) -> Result<String, ClassifierError> {
        let model = self.selected_model().await?;
        let payload = ChatPayload {
            model: &model,
            messages,
            stream: false,
            options: ChatOptions {
                temperature: self.temperature,
            },
        };
        debug!(model = %model, messages = messages.len(), "sending chat request to ollama");
        let reply: ChatReply = self
            .request(self.http.post(self.url("/api/chat")).json(&payload))
            .await?;
        match reply.message {
            Some(message) => Ok(message.content),
            None => {
                error!("unexpected ollama chat response format");
                Err(ClassifierError::Unavailable(
                    "Unexpected response format from Ollama chat endpoint.".to_string(),
                ))
            }
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn request<T: for<'de> Deserialize<'de>>(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<T, ClassifierError> {
        let response = builder.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), body = %body, "ollama http error");
            return Err(ClassifierError::Unavailable(format!(
                "Ollama HTTP error: {} - {body}",
                status.as_u16()
            )));
        }
        response.json::<T>().await.map_err(|e| {
            error!(error = %e, "failed to decode ollama response");
            ClassifierError::Unavailable(format!("Unexpected Ollama error: {e}"))
        })
    }

    fn transport_error(&self, e: reqwest::Error) -> ClassifierError {
        error!(error = %e, base_url = %self.base_url, "ollama request failed");
        let message = if e.is_timeout() {
            format!("Ollama request timed out after {}s.", self.timeout_secs)
        } else if e.is_connect() {
            format!(
                "Could not connect to Ollama server at {}. Is it running?",
                self.base_url
            )
        } else {
            format!("Unexpected Ollama error: {e}")
        };
        ClassifierError::Unavailable(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn config(base_url: &str, model: Option<&str>) -> LlmConfig {
        LlmConfig {
            base_url: base_url.to_string(),
            model: model.map(String::from),
            timeout_secs: 5,
            ..LlmConfig::default()
        }
    }

    fn tags_body(names: &[&str]) -> String {
        let models: Vec<_> = names.iter().map(|n| json!({ "name": n })).collect();
        json!({ "models": models }).to_string()
    }

    #[tokio::test]
    async fn test_prefers_configured_model() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/tags")
            .with_header("content-type", "application/json")
            .with_body(tags_body(&["mistral:7b", "gpt-oss:20b"]))
            .create_async()
            .await;

        let client = OllamaClient::new(&config(&server.url(), Some("mistral:7b"))).unwrap();
        let detection = client.detect().await;
        assert!(detection.ollama_up);
        assert_eq!(detection.selected_model.as_deref(), Some("mistral:7b"));
        assert!(!detection.fallback_used);
    }

    #[tokio::test]
    async fn test_falls_back_when_default_missing() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/tags")
            .with_header("content-type", "application/json")
            .with_body(tags_body(&["llama3.1:8b"]))
            .create_async()
            .await;

        let client = OllamaClient::new(&config(&server.url(), Some("missing:1b"))).unwrap();
        let detection = client.detect().await;
        assert_eq!(detection.selected_model.as_deref(), Some("llama3.1:8b"));
        assert!(detection.fallback_used);
        assert!(detection.model_available);
    }

    #[tokio::test]
    async fn test_no_preferred_model_installed() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/tags")
            .with_header("content-type", "application/json")
            .with_body(tags_body(&["phi3:mini"]))
            .expect_at_least(1)
            .create_async()
            .await;

        let client = OllamaClient::new(&config(&server.url(), None)).unwrap();
        let detection = client.detect().await;
        assert!(detection.ollama_up);
        assert!(!detection.model_available);
        assert!(detection.reason.contains("no preferred models"));

        let err = client
            .chat(&[OllamaMessage::new("user", "hi")])
            .await
            .unwrap_err();
        assert!(matches!(err, ClassifierError::ModelUnavailable(_)));
    }

    #[tokio::test]
    async fn test_unreachable_server_reported_down() {
        let client = OllamaClient::new(&config("http://127.0.0.1:1", None)).unwrap();
        let detection = client.detect().await;
        assert!(!detection.ollama_up);
        assert!(detection.selected_model.is_none());

        let err = client
            .chat(&[OllamaMessage::new("user", "hi")])
            .await
            .unwrap_err();
        assert!(matches!(err, ClassifierError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_chat_sends_non_streaming_request() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/tags")
            .with_header("content-type", "application/json")
            .with_body(tags_body(&["gpt-oss:20b"]))
            .create_async()
            .await;
        let chat = server
            .mock("POST", "/api/chat")
            .match_body(Matcher::PartialJson(json!({
                "model": "gpt-oss:20b",
                "stream": false,
                "messages": [{ "role": "user", "content": "hi" }]
            })))
            .with_header("content-type", "application/json")
            .with_body(json!({ "message": { "role": "assistant", "content": "hello" } }).to_string())
            .create_async()
            .await;

        let client = OllamaClient::new(&config(&server.url(), None)).unwrap();
        let reply = client.chat(&[OllamaMessage::new("user", "hi")]).await.unwrap();
        assert_eq!(reply, "hello");
        chat.assert_async().await;
    }

    #[tokio::test]
    async fn test_http_error_is_unavailable() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/tags")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let client = OllamaClient::new(&config(&server.url(), None)).unwrap();
        let detection = client.detect().await;
        assert!(!detection.ollama_up);
        assert!(detection.reason.contains("500"));
    }
}
