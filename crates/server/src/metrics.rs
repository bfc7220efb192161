//! Prometheus metrics for the Sample It server.
//!
//! `/metrics` is unauthenticated so Prometheus can scrape it. The metrics are
//! aggregate counts only (no sample names, users or keys), but the endpoint
//! should still be reachable only from the scraper's network.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{
    self, Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry,
    TextEncoder,
};
use std::sync::{LazyLock, Once};

/// Global Prometheus registry for all metrics.
pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

pub static SAMPLES_UPLOADED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "sampleit_samples_uploaded_total",
        "Total number of samples stored and persisted",
    )
    .expect("metric creation failed")
});

pub static BYTES_UPLOADED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "sampleit_bytes_uploaded_total",
        "Total audio bytes written to object storage",
    )
    .expect("metric creation failed")
});

pub static UPLOAD_FAILURES: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "sampleit_upload_failures_total",
            "Upload failures by workflow stage",
        ),
        &["stage"],
    )
    .expect("metric creation failed")
});

pub static UPLOAD_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "sampleit_upload_duration_seconds",
            "Time from first body byte to persisted sample",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
    )
    .expect("metric creation failed")
});

pub static SAMPLES_SAVED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "sampleit_samples_saved_total",
        "Total number of saved-sample links created",
    )
    .expect("metric creation failed")
});

pub static USERS_REGISTERED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "sampleit_users_registered_total",
        "Total number of user registrations",
    )
    .expect("metric creation failed")
});

pub static ANALYSIS_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "sampleit_analysis_duration_seconds",
            "Time spent estimating tempo and key",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
    )
    .expect("metric creation failed")
});

pub static ANALYSIS_FAILURES: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "sampleit_analysis_failures_total",
        "Uploads whose audio could not be analyzed",
    )
    .expect("metric creation failed")
});

static REGISTER_ONCE: Once = Once::new();

/// Register all metrics with the global registry. Later calls are no-ops.
pub fn register_metrics() {
    REGISTER_ONCE.call_once(|| {
        REGISTRY
            .register(Box::new(SAMPLES_UPLOADED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(BYTES_UPLOADED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(UPLOAD_FAILURES.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(UPLOAD_DURATION.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(SAMPLES_SAVED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(USERS_REGISTERED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(ANALYSIS_DURATION.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(ANALYSIS_FAILURES.clone()))
            .expect("metric registration failed");
    });
}

/// GET /metrics - Prometheus metrics endpoint.
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = Vec::new();
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            format!("Failed to encode metrics: {e}").into_bytes(),
        ),
    }
}

/// Record an upload failure at `stage` (`validation`, `storage`, `metadata`).
pub fn record_upload_failure(stage: &str) {
    UPLOAD_FAILURES.with_label_values(&[stage]).inc();
}
