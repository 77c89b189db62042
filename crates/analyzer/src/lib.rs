use std::sync::Arc;
use std::time::{Duration, Instant};

use sift_core::{
    assemble, normalize_issues, normalize_products, normalize_sentiment, AnalysisError,
    AnalysisRequest, AnalysisResult, Classification,
};
use sift_inference::{
    ChatMessage, CompletionRequest, DecodingOptions, GatewayOptions, InferenceClient,
};
use sift_observability::{AnalysisOutcome, AppMetrics};
use tracing::{debug, info, instrument, warn};

pub const DEFAULT_MODEL: &str = "@cf/meta/llama-3.1-8b-instruct";
pub const DEFAULT_MAX_TOKENS: u32 = 100;
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3 * 60 * 60);
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(20);
pub const DEFAULT_REQUEST_DEADLINE: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    pub model: String,
    pub max_tokens: u32,
    pub gateway_id: String,
    pub cache_ttl: Duration,
    pub skip_cache: bool,
    pub per_call_timeout: Duration,
    pub request_deadline: Duration,
}

impl AnalyzerConfig {
    pub fn new(gateway_id: impl Into<String>) -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            gateway_id: gateway_id.into(),
            cache_ttl: DEFAULT_CACHE_TTL,
            skip_cache: false,
            per_call_timeout: DEFAULT_CALL_TIMEOUT,
            request_deadline: DEFAULT_REQUEST_DEADLINE,
        }
    }
}

/// Fans one request out into the three classification calls and folds the
/// answers back into a single result. All three must succeed.
#[derive(Clone)]
pub struct Analyzer {
    client: Arc<dyn InferenceClient>,
    config: AnalyzerConfig,
    metrics: Arc<AppMetrics>,
}

impl Analyzer {
    pub fn new(
        client: Arc<dyn InferenceClient>,
        config: AnalyzerConfig,
        metrics: Arc<AppMetrics>,
    ) -> Self {
        Self {
            client,
            config,
            metrics,
        }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn backend_name(&self) -> &'static str {
        self.client.backend_name()
    }

    #[instrument(skip(self, request), fields(chars = request.text().len()))]
    pub async fn analyze(&self, request: AnalysisRequest) -> Result<AnalysisResult, AnalysisError> {
        let started = Instant::now();
        let outcome = self.run(&request).await;
        let elapsed = started.elapsed();

        match &outcome {
            Ok(result) => {
                self.metrics
                    .record_analysis(elapsed, AnalysisOutcome::Completed);
                info!(
                    sentiment = %result.sentiment.label,
                    products = result.products.len(),
                    issue = %result.issues.join(","),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "analysis completed"
                );
            }
            Err(error) => {
                self.metrics.record_analysis(elapsed, AnalysisOutcome::Failed);
                warn!(kind = ?error.kind(), error = %error, "analysis failed");
            }
        }

        outcome
    }

    pub fn completion_request(&self, axis: Classification, text: &str) -> CompletionRequest {
        CompletionRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage::system(axis.system_prompt()),
                ChatMessage::user(text),
            ],
            options: DecodingOptions {
                temperature: 0.0,
                max_tokens: self.config.max_tokens,
            },
            gateway: GatewayOptions {
                id: self.config.gateway_id.clone(),
                cache_ttl: self.config.cache_ttl,
                skip_cache: self.config.skip_cache,
            },
        }
    }

    async fn run(&self, request: &AnalysisRequest) -> Result<AnalysisResult, AnalysisError> {
        self.ensure_configured()?;
        let text = request.text();

        let fan_out = async {
            tokio::try_join!(
                self.classify(Classification::Sentiment, text),
                self.classify(Classification::Products, text),
                self.classify(Classification::Issues, text),
            )
        };
        let (sentiment, products, issues) =
            tokio::time::timeout(self.config.request_deadline, fan_out)
                .await
                .map_err(|_| AnalysisError::Deadline(self.config.request_deadline))??;

        let sentiment = normalize_sentiment(&sentiment)?;
        Ok(assemble(
            sentiment,
            normalize_products(&products),
            normalize_issues(&issues),
        ))
    }

    async fn classify(&self, axis: Classification, text: &str) -> Result<String, AnalysisError> {
        let request = self.completion_request(axis, text);
        self.metrics.add_inference_calls(1);

        let timeout = self.config.per_call_timeout;
        match tokio::time::timeout(timeout, self.client.complete(request)).await {
            Ok(Ok(completion)) => {
                debug!(axis = %axis, completion = completion.text(), "classification answered");
                Ok(completion.into_text())
            }
            Ok(Err(error)) => Err(AnalysisError::Inference {
                axis,
                message: error.to_string(),
            }),
            Err(_) => Err(AnalysisError::Inference {
                axis,
                message: format!("timed out after {timeout:?}"),
            }),
        }
    }

    fn ensure_configured(&self) -> Result<(), AnalysisError> {
        if self.config.gateway_id.trim().is_empty() {
            return Err(AnalysisError::Configuration(
                "gateway id is missing".to_string(),
            ));
        }
        if self.config.model.trim().is_empty() {
            return Err(AnalysisError::Configuration("model is missing".to_string()));
        }
        Ok(())
    }
}
