//! Ollama chat backend.
//!
//! Talks to `POST {endpoint}/api/chat` with streaming disabled. Text parts of
//! a message are concatenated into `content`; image parts go to `images`.

use async_trait::async_trait;
use mmrag_core::{ChatMessage, ChatModel, LlmError, Role};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Connection settings for an Ollama server.
#[derive(Debug, Clone, PartialEq)]
pub struct OllamaConfig {
    /// Base URL, without the `/api/chat` suffix
    pub endpoint: String,
    /// Model name, e.g. `llava`
    pub model: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434".to_string(),
            model: "llava".to_string(),
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    images: Vec<&'a str>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

fn role_name(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
    }
}

fn to_wire(message: &ChatMessage) -> WireMessage<'_> {
    WireMessage {
        role: role_name(message.role),
        content: message.text(),
        images: message.images().collect(),
    }
}

/// [`ChatModel`] backed by a local or remote Ollama server.
pub struct OllamaChat {
    config: OllamaConfig,
    client: reqwest::Client,
}

impl OllamaChat {
    /// Create a client for `config`.
    pub fn new(config: OllamaConfig) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                LlmError::BackendUnavailable(format!("Failed to create HTTP client: {e}"))
            })?;
        Ok(Self { config, client })
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.config.endpoint.trim_end_matches('/'))
    }
}

#[async_trait]
impl ChatModel for OllamaChat {
    fn model_name(&self) -> &str {
        &self.config.model
    }

    async fn invoke(&self, messages: &[ChatMessage]) -> Result<ChatMessage, LlmError> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: messages.iter().map(to_wire).collect(),
            stream: false,
        };
        debug!(
            "Sending {} messages to {} ({})",
            request.messages.len(),
            self.chat_url(),
            self.config.model
        );

        let response = self
            .client
            .post(self.chat_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::BackendUnavailable(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LlmError::BackendUnavailable(format!("reading response: {e}")))?;

        if !status.is_success() {
            return Err(LlmError::Backend {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse =
            serde_json::from_str(&body).map_err(|e| LlmError::InvalidResponse(e.to_string()))?;
        Ok(ChatMessage::assistant(parsed.message.content))
    }
}
