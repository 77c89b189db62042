use std::env;
use std::time::Duration;

use sift_analyzer::{
    AnalyzerConfig, DEFAULT_CACHE_TTL, DEFAULT_CALL_TIMEOUT, DEFAULT_MAX_TOKENS, DEFAULT_MODEL,
    DEFAULT_REQUEST_DEADLINE,
};
use sift_inference::{WorkersAiConfig, DEFAULT_GATEWAY_BASE_URL};

#[derive(Debug, Clone)]
pub struct Settings {
    pub bind: String,
    pub workers_ai: Option<WorkersAiConfig>,
    pub analyzer: AnalyzerConfig,
    pub allowed_origins: Vec<String>,
}

impl Settings {
    pub fn from_env() -> Self {
        let bind = env::var("SIFT_BIND").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        let analyzer = AnalyzerConfig {
            model: non_empty_var("SIFT_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            max_tokens: env::var("SIFT_MAX_TOKENS")
                .ok()
                .and_then(|value| value.trim().parse::<u32>().ok())
                .map(|value| value.clamp(8, 1_024))
                .unwrap_or(DEFAULT_MAX_TOKENS),
            gateway_id: non_empty_var("SIFT_GATEWAY_ID").unwrap_or_default(),
            cache_ttl: seconds_var("SIFT_CACHE_TTL_SECONDS").unwrap_or(DEFAULT_CACHE_TTL),
            skip_cache: env::var("SIFT_SKIP_CACHE")
                .map(|value| matches!(value.trim(), "1" | "true" | "yes"))
                .unwrap_or(false),
            per_call_timeout: seconds_var("SIFT_CALL_TIMEOUT_SECONDS")
                .unwrap_or(DEFAULT_CALL_TIMEOUT),
            request_deadline: seconds_var("SIFT_REQUEST_DEADLINE_SECONDS")
                .unwrap_or(DEFAULT_REQUEST_DEADLINE),
        };

        Self {
            bind,
            workers_ai: build_workers_ai_config(),
            analyzer,
            allowed_origins: parse_allowed_origins(),
        }
    }
}

fn build_workers_ai_config() -> Option<WorkersAiConfig> {
    let account_id = non_empty_var("SIFT_ACCOUNT_ID")?;
    let api_token = non_empty_var("SIFT_API_TOKEN")?;
    let base_url = non_empty_var("SIFT_GATEWAY_BASE_URL")
        .unwrap_or_else(|| DEFAULT_GATEWAY_BASE_URL.to_string());

    Some(WorkersAiConfig {
        base_url,
        account_id,
        api_token,
    })
}

fn parse_allowed_origins() -> Vec<String> {
    let default_origins = ["http://localhost:3000", "http://127.0.0.1:3000"];

    env::var("SIFT_ALLOWED_ORIGINS")
        .ok()
        .map(|value| {
            value
                .split(',')
                .map(|origin| origin.trim().trim_end_matches('/').to_string())
                .filter(|origin| !origin.is_empty())
                .collect::<Vec<_>>()
        })
        .unwrap_or_else(|| default_origins.iter().map(|value| value.to_string()).collect())
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn seconds_var(name: &str) -> Option<Duration> {
    env::var(name)
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|value| *value > 0)
        .map(Duration::from_secs)
}
