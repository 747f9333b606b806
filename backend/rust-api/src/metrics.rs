use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_histogram_vec, register_int_counter_vec, register_int_gauge,
    Encoder, Histogram, HistogramVec, IntCounterVec, IntGauge, TextEncoder,
};

lazy_static! {
    // HTTP Metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .unwrap();

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .unwrap();

    // Quiz Metrics
    pub static ref ANSWERS_SUBMITTED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "answers_submitted_total",
        "Total number of answers submitted",
        &["outcome"]
    )
    .unwrap();

    pub static ref PROMPTS_RELAYED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "prompts_relayed_total",
        "Total number of prompts forwarded to the assistant",
        &["status"]
    )
    .unwrap();

    pub static ref USERS_TOTAL: IntGauge = register_int_gauge!(
        "quiz_users_total",
        "Number of users with quiz state"
    )
    .unwrap();

    // Snapshot Metrics
    pub static ref SNAPSHOT_WRITES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "snapshot_writes_total",
        "Total number of state snapshot writes",
        &["status"]
    )
    .unwrap();

    pub static ref SNAPSHOT_WRITE_DURATION_SECONDS: Histogram = register_histogram!(
        "snapshot_write_duration_seconds",
        "State snapshot write duration in seconds",
        vec![0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5]
    )
    .unwrap();
}

/// Renders all metrics in Prometheus text format
pub fn render_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer)
        .map_err(|e| prometheus::Error::Msg(format!("Failed to convert metrics to UTF-8: {}", e)))
}
