//! Prometheus metrics for pedagogy-service.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, register_int_gauge, CounterVec, HistogramVec,
    IntGauge, TextEncoder,
};

/// Generation requests by module and outcome.
pub static GENERATIONS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "pedagogy_generations_total",
        "Total number of generation requests",
        &["module", "status"]
    )
    .expect("Failed to register generations_total")
});

/// Provider latency by module.
pub static PROVIDER_LATENCY: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "pedagogy_provider_latency_seconds",
        "Text provider latency in seconds",
        &["module"],
        vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0, 120.0]
    )
    .expect("Failed to register provider_latency")
});

/// Tokens consumed, split into input and output.
pub static TOKENS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "pedagogy_tokens_total",
        "Total tokens processed",
        &["type"]
    )
    .expect("Failed to register tokens_total")
});

/// Provider errors by kind.
pub static PROVIDER_ERRORS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "pedagogy_provider_errors_total",
        "Total text provider errors by type",
        &["error_type"]
    )
    .expect("Failed to register provider_errors_total")
});

/// Evaluation jobs by lifecycle event: enqueued, rejected, completed, error.
pub static EVALUATION_JOBS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "pedagogy_evaluation_jobs_total",
        "Total evaluation jobs by lifecycle event",
        &["event"]
    )
    .expect("Failed to register evaluation_jobs_total")
});

/// Evaluation jobs currently being processed.
pub static EVALUATION_JOBS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "pedagogy_evaluation_jobs_in_flight",
        "Evaluation jobs currently being processed"
    )
    .expect("Failed to register evaluation_jobs_in_flight")
});

/// Document exports by format and outcome.
pub static EXPORTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "pedagogy_exports_total",
        "Total document exports",
        &["format", "status"]
    )
    .expect("Failed to register exports_total")
});

/// Database query duration histogram.
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "pedagogy_db_query_duration_seconds",
        "Database query duration in seconds",
        &["operation"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    )
    .expect("Failed to register db_query_duration")
});

/// Initialize all metrics (forces lazy initialization).
pub fn init_metrics() {
    Lazy::force(&GENERATIONS_TOTAL);
    Lazy::force(&PROVIDER_LATENCY);
    Lazy::force(&TOKENS_TOTAL);
    Lazy::force(&PROVIDER_ERRORS_TOTAL);
    Lazy::force(&EVALUATION_JOBS_TOTAL);
    Lazy::force(&EVALUATION_JOBS_IN_FLIGHT);
    Lazy::force(&EXPORTS_TOTAL);
    Lazy::force(&DB_QUERY_DURATION);
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder
        .encode_to_string(&metric_families)
        .unwrap_or_default()
}
