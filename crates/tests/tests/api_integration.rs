use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use sift_analyzer::{Analyzer, AnalyzerConfig};
use sift_api::{build_router, ApiState, ANALYZE_PATH};
use sift_core::{Classification, ISSUE_FALLBACK, ISSUE_TAXONOMY, PRODUCT_CATALOG};
use sift_inference::{Script, ScriptedInference};
use sift_observability::AppMetrics;
use tower::ServiceExt;

fn backend(sentiment: &str, products: &str, issues: &str) -> Arc<ScriptedInference> {
    Arc::new(
        ScriptedInference::new()
            .with_reply(Classification::Sentiment.system_prompt(), sentiment)
            .with_reply(Classification::Products.system_prompt(), products)
            .with_reply(Classification::Issues.system_prompt(), issues),
    )
}

fn app_with(client: Arc<ScriptedInference>) -> Router {
    build_router(state_with(client, AppMetrics::shared()))
}

fn state_with(client: Arc<ScriptedInference>, metrics: Arc<AppMetrics>) -> ApiState {
    let analyzer = Analyzer::new(client, AnalyzerConfig::new("feedback"), metrics.clone());
    ApiState::new(Some(analyzer), metrics)
}

fn analyze_request(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(ANALYZE_PATH)
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let parsed = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, parsed)
}

#[tokio::test]
async fn health_reports_inference_capability() {
    let app = app_with(backend("neutral", "none", "General"));
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["capabilities"]["inference"], true);
    assert_eq!(body["capabilities"]["backend"], "scripted");
}

#[tokio::test]
async fn successful_analysis_matches_wire_contract() {
    let client = backend("Positive", "WAF, Workers", "Feature Request");
    let app = app_with(client.clone());

    let (status, body) = send(
        app,
        analyze_request(json!({ "text": "Love the new WAF rules for Workers" }).to_string()),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "sentiment": { "label": "Positive", "color": "green" },
            "products": ["WAF", "Workers"],
            "issues": ["Feature Request"]
        })
    );
    assert_eq!(client.call_count(), 3);
}

#[tokio::test]
async fn invalid_input_never_reaches_the_backend() {
    let bodies: Vec<Body> = vec![
        Body::empty(),
        Body::from("not json"),
        Body::from(json!({}).to_string()),
        Body::from(json!({ "text": 7 }).to_string()),
        Body::from(json!({ "text": "" }).to_string()),
        Body::from(json!({ "text": "   \n\t" }).to_string()),
    ];

    for body in bodies {
        let client = backend("neutral", "none", "General");
        let (status, parsed) = send(app_with(client.clone()), analyze_request(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(parsed, json!({ "error": "Text is required" }));
        assert_eq!(client.call_count(), 0);
    }
}

#[tokio::test]
async fn failed_product_call_is_a_server_error() {
    let client = backend("negative", "R2", "Outage");
    client.set_script(
        Classification::Products.system_prompt(),
        Script::Fail("upstream reset".to_string()),
    );

    let (status, body) = send(
        app_with(client),
        analyze_request(json!({ "text": "R2 is down" }).to_string()),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to analyze text");
    let details = body["details"].as_str().unwrap();
    assert!(details.contains("products"));
    assert!(details.contains("upstream reset"));
    assert!(body.get("products").is_none());
}

#[tokio::test]
async fn model_answers_are_constrained_to_known_domains() {
    let client = backend("neutral", "Foo, r2, Kubernetes, Durable Objects", "Something else");
    let (status, body) = send(
        app_with(client),
        analyze_request(json!({ "text": "misc" }).to_string()),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let products = body["products"].as_array().unwrap();
    assert_eq!(products.len(), 2);
    for product in products {
        let product = product.as_str().unwrap().to_lowercase();
        assert!(PRODUCT_CATALOG
            .iter()
            .any(|known| product.contains(&known.to_lowercase())));
    }

    let issues = body["issues"].as_array().unwrap();
    assert_eq!(issues.len(), 1);
    let issue = issues[0].as_str().unwrap();
    assert!(issue == ISSUE_FALLBACK || ISSUE_TAXONOMY.contains(&issue));
    assert_eq!(issue, "General Question");
}

#[tokio::test]
async fn identical_inputs_produce_identical_bodies() {
    let client = backend("negative", "D1", "Performance");
    let app = app_with(client);
    let payload = json!({ "text": "D1 queries got slower" }).to_string();

    let (_, first) = send(app.clone(), analyze_request(payload.clone())).await;
    let (_, second) = send(app, analyze_request(payload)).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn responses_carry_a_generated_request_id() {
    let app = app_with(backend("neutral", "none", "General"));

    let analyzed = app
        .clone()
        .oneshot(analyze_request(json!({ "text": "hello" }).to_string()))
        .await
        .unwrap();
    let generated = analyzed
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .expect("x-request-id should be generated");
    assert!(!generated.is_empty());

    let rejected = app.oneshot(analyze_request(Body::empty())).await.unwrap();
    assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);
    assert!(rejected.headers().get("x-request-id").is_some());
}

#[tokio::test]
async fn caller_request_id_is_echoed() {
    let app = app_with(backend("neutral", "none", "General"));
    let mut request = analyze_request(json!({ "text": "hello" }).to_string());
    request
        .headers_mut()
        .insert("x-request-id", "trace-42".parse().unwrap());

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.headers().get("x-request-id").unwrap(), "trace-42");
}

#[tokio::test]
async fn health_latency_covers_only_analyses() {
    let metrics = AppMetrics::shared();
    let app = build_router(state_with(backend("positive", "KV", "General"), metrics.clone()));

    let blank = analyze_request(json!({ "text": " " }).to_string());
    let (status, _) = send(app.clone(), blank).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let valid = analyze_request(json!({ "text": "KV" }).to_string());
    let (status, _) = send(app.clone(), valid).await;
    assert_eq!(status, StatusCode::OK);

    let health = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let (_, body) = send(app, health).await;
    let reported = &body["metrics"];
    assert_eq!(reported["requests_total"], 2);
    assert_eq!(reported["rejected"]["invalid_input"], 1);
    assert_eq!(reported["analyses"]["completed"], 1);
    assert_eq!(reported["analyses"]["failed"], 0);

    let snapshot = metrics.snapshot();
    assert_eq!(
        reported["analyses"]["avg_latency_millis"].as_f64().unwrap(),
        snapshot.analyses.max_latency_millis as f64
    );
}
