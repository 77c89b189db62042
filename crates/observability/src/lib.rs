use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

static TRACING_INIT: OnceCell<()> = OnceCell::new();

/// Why a request was turned away before any analysis started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    InvalidInput,
    BackendUnavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisOutcome {
    Completed,
    Failed,
}

/// Counters for the analysis endpoint. Latency is only ever recorded for
/// analyses, so rejected requests do not dilute the averages.
#[derive(Debug, Default)]
pub struct AppMetrics {
    requests: AtomicU64,
    invalid_input: AtomicU64,
    backend_unavailable: AtomicU64,
    inference_calls: AtomicU64,
    analyses: AnalysisCounters,
}

#[derive(Debug, Default)]
struct AnalysisCounters {
    completed: AtomicU64,
    failed: AtomicU64,
    latency_millis_sum: AtomicU64,
    latency_millis_max: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub requests_total: u64,
    pub rejected: RejectionSnapshot,
    pub inference_calls_total: u64,
    pub analyses: AnalysisSnapshot,
}

#[derive(Debug, Clone, Serialize)]
pub struct RejectionSnapshot {
    pub invalid_input: u64,
    pub backend_unavailable: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisSnapshot {
    pub completed: u64,
    pub failed: u64,
    pub avg_latency_millis: f64,
    pub max_latency_millis: u64,
}

impl AppMetrics {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejection(&self, rejection: Rejection) {
        let counter = match rejection {
            Rejection::InvalidInput => &self.invalid_input,
            Rejection::BackendUnavailable => &self.backend_unavailable,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_inference_calls(&self, calls: usize) {
        self.inference_calls
            .fetch_add(calls as u64, Ordering::Relaxed);
    }

    pub fn record_analysis(&self, elapsed: Duration, outcome: AnalysisOutcome) {
        let analyses = &self.analyses;
        let millis = elapsed.as_millis() as u64;
        match outcome {
            AnalysisOutcome::Completed => analyses.completed.fetch_add(1, Ordering::Relaxed),
            AnalysisOutcome::Failed => analyses.failed.fetch_add(1, Ordering::Relaxed),
        };
        analyses
            .latency_millis_sum
            .fetch_add(millis, Ordering::Relaxed);
        analyses
            .latency_millis_max
            .fetch_max(millis, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let analyses = &self.analyses;
        let completed = analyses.completed.load(Ordering::Relaxed);
        let failed = analyses.failed.load(Ordering::Relaxed);
        let runs = completed + failed;
        let latency_sum = analyses.latency_millis_sum.load(Ordering::Relaxed);

        MetricsSnapshot {
            requests_total: self.requests.load(Ordering::Relaxed),
            rejected: RejectionSnapshot {
                invalid_input: self.invalid_input.load(Ordering::Relaxed),
                backend_unavailable: self.backend_unavailable.load(Ordering::Relaxed),
            },
            inference_calls_total: self.inference_calls.load(Ordering::Relaxed),
            analyses: AnalysisSnapshot {
                completed,
                failed,
                avg_latency_millis: if runs == 0 {
                    0.0
                } else {
                    latency_sum as f64 / runs as f64
                },
                max_latency_millis: analyses.latency_millis_max.load(Ordering::Relaxed),
            },
        }
    }
}

pub fn init_tracing(service_name: &str) {
    TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{service_name}=info,sift_api=info,sift_analyzer=info,sift_inference=warn"
            ))
        });

        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .init();
    });
}
