//! Metrics definitions for the sand prediction service.
//!
//! All metrics follow Prometheus naming conventions:
//! - `sand_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded to prevent cardinality explosion:
//! - `status`: bounded by outcome (success, error, invalid_input, inference_failure)
//! - `error_category`: 4 values (see `ErrorCategory`)
//! - `table`: 2 values (season, region)
//! - `endpoint`: the fixed route set plus `/other`

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize Prometheus metrics recorder and return the handle
/// for serving metrics via HTTP.
///
/// Must be called before any metrics are recorded.
///
/// # Errors
///
/// Returns error if Prometheus recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("sand_http_request".to_string()),
            &[
                0.005, 0.010, 0.025, 0.050, 0.100, 0.200, 0.300, 0.500, 1.000, 2.000, 5.000,
            ],
        )
        .map_err(|e| format!("Failed to set HTTP request buckets: {e}"))?
        // Model evaluation is sub-millisecond for linear models; keep resolution at the low end
        .set_buckets_for_metric(
            Matcher::Prefix("sand_prediction".to_string()),
            &[
                0.0005, 0.001, 0.002, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 1.000,
            ],
        )
        .map_err(|e| format!("Failed to set prediction buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

// ============================================================================
// Auth Gate Metrics
// ============================================================================

/// Record a login attempt
///
/// Metric: `sand_login_total`
/// Labels: `status` (success, error)
pub fn record_login(status: &str) {
    counter!("sand_login_total", "status" => status.to_string()).increment(1);
}

/// Record token validation result
///
/// Metric: `sand_token_validations_total`
/// Labels: `status`, `error_category`
pub fn record_token_validation(status: &str, error_category: Option<&str>) {
    let category = error_category.unwrap_or("none");
    counter!("sand_token_validations_total", "status" => status.to_string(), "error_category" => category.to_string())
        .increment(1);
}

// ============================================================================
// Inference Metrics
// ============================================================================

/// Record one pass through the inference pipeline
///
/// Metric: `sand_prediction_duration_seconds`, `sand_predictions_total`
/// Labels: `status` (success, invalid_input, inference_failure)
pub fn record_prediction(status: &str, duration: Duration) {
    histogram!("sand_prediction_duration_seconds", "status" => status.to_string())
        .record(duration.as_secs_f64());

    counter!("sand_predictions_total", "status" => status.to_string()).increment(1);
}

/// Record a lookup that resolved to the `Unknown` sentinel
///
/// Metric: `sand_lookup_fallback_total`
/// Labels: `table` (season, region)
pub fn record_lookup_fallback(table: &str) {
    counter!("sand_lookup_fallback_total", "table" => table.to_string()).increment(1);
}

// ============================================================================
// HTTP Metrics
// ============================================================================

/// Record HTTP request completion
///
/// Metric: `sand_http_requests_total`, `sand_http_request_duration_seconds`
/// Labels: `method`, `endpoint`, `status_code` / `status`
pub fn record_http_request(method: &str, endpoint: &str, status_code: u16, duration: Duration) {
    let normalized_endpoint = normalize_endpoint(endpoint);
    let status = categorize_status_code(status_code);

    histogram!("sand_http_request_duration_seconds",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint,
        "status" => status.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("sand_http_requests_total",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint,
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

/// Categorize HTTP status code into success/error/timeout
fn categorize_status_code(status_code: u16) -> &'static str {
    match status_code {
        200..=299 => "success",
        408 | 504 => "timeout",
        _ => "error",
    }
}

/// Collapse unknown paths into a single label value.
fn normalize_endpoint(path: &str) -> &'static str {
    match path {
        "/" => "/",
        "/login" => "/login",
        "/upload" => "/upload",
        "/health" => "/health",
        "/ready" => "/ready",
        "/metrics" => "/metrics",
        _ => "/other",
    }
}
