mod scripted;
mod workers_ai;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use scripted::{Script, ScriptedInference};
pub use workers_ai::{WorkersAiClient, WorkersAiConfig, DEFAULT_GATEWAY_BASE_URL};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodingOptions {
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Routing and caching hints forwarded to the gateway. The gateway, not this
/// crate, is responsible for caching identical (model, prompt, text) calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayOptions {
    pub id: String,
    pub cache_ttl: Duration,
    pub skip_cache: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub options: DecodingOptions,
    pub gateway: GatewayOptions,
}

impl CompletionRequest {
    pub fn system_prompt(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|message| message.role == Role::System)
            .map(|message| message.content.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    text: String,
}

impl Completion {
    pub fn from_raw(raw: &str) -> Result<Self, InferenceError> {
        let text = raw.trim();
        if text.is_empty() {
            return Err(InferenceError::EmptyCompletion);
        }
        Ok(Self {
            text: text.to_string(),
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("inference request failed: {0}")]
    Transport(String),
    #[error("inference backend returned status {status}: {body}")]
    Backend { status: u16, body: String },
    #[error("inference response was malformed: {0}")]
    MalformedResponse(String),
    #[error("inference backend returned an empty completion")]
    EmptyCompletion,
}

#[async_trait]
pub trait InferenceClient: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, InferenceError>;

    fn backend_name(&self) -> &'static str;
}
