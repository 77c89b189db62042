mod config;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::body::{Body, Bytes};
use axum::extract::{Json, State};
use axum::http::{header, HeaderValue, Method, Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::Serialize;
use sift_analyzer::Analyzer;
use sift_core::{validate_body, AnalysisError, ErrorKind};
use sift_inference::WorkersAiClient;
use sift_observability::{AppMetrics, Rejection};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, error};

pub use config::Settings;

pub const ANALYZE_PATH: &str = "/api/analyze";
const MAX_BODY_BYTES: usize = 64 * 1024;
const VALIDATION_MESSAGE: &str = "Text is required";
const FAILURE_MESSAGE: &str = "Failed to analyze text";

#[derive(Clone)]
pub struct ApiState {
    pub analyzer: Option<Analyzer>,
    pub metrics: Arc<AppMetrics>,
    pub allowed_origins: Arc<Vec<String>>,
}

impl ApiState {
    pub fn new(analyzer: Option<Analyzer>, metrics: Arc<AppMetrics>) -> Self {
        Self {
            analyzer,
            metrics,
            allowed_origins: Arc::new(Vec::new()),
        }
    }

    pub fn with_allowed_origins(mut self, origins: Vec<String>) -> Self {
        self.allowed_origins = Arc::new(origins);
        self
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp_utc: String,
    metrics: sift_observability::MetricsSnapshot,
    capabilities: HealthCapabilities,
}

#[derive(Debug, Serialize)]
struct HealthCapabilities {
    inference: bool,
    backend: Option<&'static str>,
    model: Option<String>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

pub fn build_app(settings: &Settings) -> Result<Router> {
    let metrics = AppMetrics::shared();

    let analyzer = match settings.workers_ai.clone() {
        Some(workers_ai) => {
            let client = WorkersAiClient::connect(workers_ai, settings.analyzer.per_call_timeout)
                .context("failed to build inference client")?;
            Some(Analyzer::new(
                Arc::new(client),
                settings.analyzer.clone(),
                metrics.clone(),
            ))
        }
        None => {
            tracing::warn!("SIFT_ACCOUNT_ID / SIFT_API_TOKEN not set; analysis requests will fail");
            None
        }
    };

    let state = ApiState::new(analyzer, metrics)
        .with_allowed_origins(settings.allowed_origins.clone());
    Ok(build_router(state))
}

pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(ANALYZE_PATH, post(analyze))
        .layer(build_cors_layer(&state.allowed_origins))
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state)
}

async fn health(State(state): State<ApiState>) -> impl IntoResponse {
    let payload = HealthResponse {
        status: "ok",
        timestamp_utc: chrono::Utc::now().to_rfc3339(),
        metrics: state.metrics.snapshot(),
        capabilities: HealthCapabilities {
            inference: state.analyzer.is_some(),
            backend: state.analyzer.as_ref().map(Analyzer::backend_name),
            model: state
                .analyzer
                .as_ref()
                .map(|analyzer| analyzer.config().model.clone()),
        },
    };

    (StatusCode::OK, Json(payload))
}

async fn analyze(State(state): State<ApiState>, body: Bytes) -> Response {
    state.metrics.inc_request();

    let request = match validate_body(&body) {
        Ok(request) => request,
        Err(error) => {
            state.metrics.record_rejection(Rejection::InvalidInput);
            debug!(error = %error, "rejected analysis request");
            return error_response(&error);
        }
    };

    let Some(analyzer) = state.analyzer.as_ref() else {
        let error =
            AnalysisError::Configuration("inference credentials are not configured".to_string());
        state.metrics
            .record_rejection(Rejection::BackendUnavailable);
        error!(error = %error, "analysis unavailable");
        return error_response(&error);
    };

    match analyzer.analyze(request).await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(error) => error_response(&error),
    }
}

fn error_response(error: &AnalysisError) -> Response {
    match error.kind() {
        ErrorKind::Validation => (
            StatusCode::BAD_REQUEST,
            Json(ErrorBody {
                error: VALIDATION_MESSAGE,
                details: None,
            }),
        )
            .into_response(),
        ErrorKind::Configuration | ErrorKind::Inference => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorBody {
                error: FAILURE_MESSAGE,
                details: Some(error.to_string()),
            }),
        )
            .into_response(),
    }
}

fn build_cors_layer(allowed_origins: &Arc<Vec<String>>) -> CorsLayer {
    let origins = allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect::<Vec<_>>();
    let origins = if origins.is_empty() {
        vec![HeaderValue::from_static("http://localhost:3000")]
    } else {
        origins
    };

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

async fn security_headers_middleware(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;

    response.headers_mut().insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    response.headers_mut().insert(
        header::HeaderName::from_static("x-frame-options"),
        HeaderValue::from_static("DENY"),
    );
    response.headers_mut().insert(
        header::HeaderName::from_static("referrer-policy"),
        HeaderValue::from_static("no-referrer"),
    );
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-store"),
    );

    response
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::to_bytes;
    use sift_core::{Classification, ValidationIssue};
    use tower::ServiceExt;

    use super::*;

    #[tokio::test]
    async fn validation_error_has_terse_body() {
        let response = error_response(&AnalysisError::Validation(ValidationIssue::BlankText));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed, serde_json::json!({ "error": "Text is required" }));
    }

    #[tokio::test]
    async fn server_errors_carry_details() {
        let response = error_response(&AnalysisError::Inference {
            axis: Classification::Products,
            message: "connection reset".to_string(),
        });
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed["error"], "Failed to analyze text");
        assert!(parsed["details"]
            .as_str()
            .unwrap()
            .contains("products classification failed"));

        let deadline = error_response(&AnalysisError::Deadline(Duration::from_secs(30)));
        assert_eq!(deadline.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn unconfigured_backend_is_a_server_error() {
        let metrics = AppMetrics::shared();
        let app = build_router(ApiState::new(None, metrics.clone()));
        let request = Request::builder()
            .method("POST")
            .uri(ANALYZE_PATH)
            .header("content-type", "application/json")
            .body(Body::from(r#"{"text":"Workers are fast"}"#))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.headers().get("x-content-type-options").unwrap(),
            "nosniff"
        );

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.rejected.backend_unavailable, 1);
        assert_eq!(snapshot.analyses.completed + snapshot.analyses.failed, 0);
    }
}
