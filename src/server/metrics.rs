//! Prometheus metrics for the generation service.

use std::sync::OnceLock;

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};

/// Global registry.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

/// Generation requests by outcome status.
pub static GENERATIONS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// End-to-end generation duration.
pub static GENERATION_DURATION_SECONDS: OnceLock<HistogramVec> = OnceLock::new();

/// Initialize all metrics. Must be called once at startup.
pub fn init_metrics() {
    let registry = Registry::new();

    let generations_total = IntCounterVec::new(
        Opts::new("generations_total", "Total generation requests"),
        &["status"],
    )
    .expect("Failed to create generations_total metric");

    let generation_duration = HistogramVec::new(
        HistogramOpts::new(
            "generation_duration_seconds",
            "Generation request duration in seconds",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &["status"],
    )
    .expect("Failed to create generation_duration_seconds metric");

    registry
        .register(Box::new(generations_total.clone()))
        .expect("Failed to register generations_total");
    registry
        .register(Box::new(generation_duration.clone()))
        .expect("Failed to register generation_duration_seconds");

    let _ = REGISTRY.set(registry);
    let _ = GENERATIONS_TOTAL.set(generations_total);
    let _ = GENERATION_DURATION_SECONDS.set(generation_duration);

    tracing::info!("Prometheus metrics initialized");
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();

    let registry = match REGISTRY.get() {
        Some(r) => r,
        None => {
            tracing::error!("Metrics registry not initialized");
            return "# Metrics registry not initialized\n".to_string();
        }
    };

    let metric_families = registry.gather();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return format!("# Failed to encode metrics: {e}\n");
    }

    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Failed to convert metrics to UTF-8");
            format!("# Failed to convert metrics to UTF-8: {e}\n")
        }
    }
}

/// Record a completed generation request.
pub fn record_generation(status: &str, duration_secs: f64) {
    if let Some(counter) = GENERATIONS_TOTAL.get() {
        counter.with_label_values(&[status]).inc();
    }
    if let Some(histogram) = GENERATION_DURATION_SECONDS.get() {
        histogram.with_label_values(&[status]).observe(duration_secs);
    }
}
