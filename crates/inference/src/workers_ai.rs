use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use crate::{ChatMessage, Completion, CompletionRequest, InferenceClient, InferenceError};

pub const DEFAULT_GATEWAY_BASE_URL: &str = "https://gateway.ai.cloudflare.com/v1";

#[derive(Debug, Clone)]
pub struct WorkersAiConfig {
    pub base_url: String,
    pub account_id: String,
    pub api_token: String,
}

/// Workers AI text generation routed through an AI Gateway.
#[derive(Debug, Clone)]
pub struct WorkersAiClient {
    http: Client,
    config: WorkersAiConfig,
}

#[derive(Debug, Serialize)]
struct GenerationBody<'a> {
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

impl WorkersAiClient {
    pub fn new(http: Client, config: WorkersAiConfig) -> Self {
        Self { http, config }
    }

    /// Builds a client with its own connection pool. `request_timeout` bounds
    /// each HTTP exchange on top of any deadline the caller applies.
    pub fn connect(
        config: WorkersAiConfig,
        request_timeout: Duration,
    ) -> Result<Self, InferenceError> {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(6))
            .timeout(request_timeout)
            .build()
            .map_err(|error| {
                InferenceError::Transport(format!("failed to build HTTP client: {error}"))
            })?;
        Ok(Self::new(http, config))
    }

    fn endpoint(&self, gateway_id: &str, model: &str) -> Result<Url, InferenceError> {
        let mut url = Url::parse(&self.config.base_url).map_err(|error| {
            InferenceError::Transport(format!("invalid gateway base url: {error}"))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                InferenceError::Transport("gateway base url cannot carry a path".to_string())
            })?
            .pop_if_empty()
            .push(&self.config.account_id)
            .push(gateway_id)
            .push("workers-ai")
            .extend(model.split('/'));
        Ok(url)
    }
}

#[async_trait]
impl InferenceClient for WorkersAiClient {
    #[instrument(skip(self, request), fields(model = %request.model, gateway = %request.gateway.id))]
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, InferenceError> {
        let url = self.endpoint(&request.gateway.id, &request.model)?;
        let body = GenerationBody {
            messages: &request.messages,
            temperature: request.options.temperature,
            max_tokens: request.options.max_tokens,
        };

        let response = self
            .http
            .post(url)
            .bearer_auth(self.config.api_token.as_str())
            .header(
                "cf-aig-cache-ttl",
                request.gateway.cache_ttl.as_secs().to_string(),
            )
            .header("cf-aig-skip-cache", request.gateway.skip_cache.to_string())
            .json(&body)
            .send()
            .await
            .map_err(|error| InferenceError::Transport(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InferenceError::Backend {
                status: status.as_u16(),
                body,
            });
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|error| InferenceError::MalformedResponse(error.to_string()))?;

        if payload.get("success").and_then(Value::as_bool) == Some(false) {
            return Err(InferenceError::Backend {
                status: status.as_u16(),
                body: payload
                    .get("errors")
                    .map(ToString::to_string)
                    .unwrap_or_default(),
            });
        }

        let text = extract_response_text(&payload).ok_or_else(|| {
            InferenceError::MalformedResponse("response text missing".to_string())
        })?;
        debug!(chars = text.len(), "completion received");
        Completion::from_raw(text)
    }

    fn backend_name(&self) -> &'static str {
        "workers-ai"
    }
}

fn extract_response_text(payload: &Value) -> Option<&str> {
    payload
        .get("result")
        .and_then(|result| result.get("response"))
        .and_then(Value::as_str)
        .or_else(|| payload.get("response").and_then(Value::as_str))
}
