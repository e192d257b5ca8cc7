//! Metrics definitions for the auth gateway.
//!
//! All metrics follow Prometheus naming conventions:
//! - `gw_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded:
//! - `method`: HTTP methods
//! - `endpoint`: parameterized paths, proxy names collapsed to `{proxy}`
//! - `status_code`: HTTP status codes
//! - `outcome`: authorized, bypassed, rejected
//! - `result`: hit, miss, expired, bypassed
//! - `status`: success, denied, unavailable, error
//!
//! API keys, tokens and client ids never appear in labels.

use metrics::{counter, gauge, histogram};
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
        // The gate sits on every proxied request; most of it should finish well under 50ms
        .set_buckets_for_metric(
            Matcher::Prefix("gw_http_request".to_string()),
            &[
                0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.200, 0.500, 1.000, 2.000,
            ],
        )
        .map_err(|e| format!("Failed to set HTTP request buckets: {e}"))?
        // Exchange calls are bounded by the transport timeout (10s default)
        .set_buckets_for_metric(
            Matcher::Prefix("gw_api_key_exchange".to_string()),
            &[
                0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.000, 2.500, 5.000, 10.000,
            ],
        )
        .map_err(|e| format!("Failed to set API-key exchange buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

// ============================================================================
// HTTP Request Metrics
// ============================================================================

/// Record HTTP request completion
///
/// Metric: `gw_http_requests_total`, `gw_http_request_duration_seconds`
/// Labels: `method`, `endpoint`, `status`
pub fn record_http_request(method: &str, endpoint: &str, status_code: u16, duration: Duration) {
    let normalized_endpoint = normalize_endpoint(endpoint);
    let status = categorize_status_code(status_code);

    histogram!("gw_http_request_duration_seconds",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint.clone(),
        "status" => status.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("gw_http_requests_total",
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

/// Normalize endpoint path to prevent label cardinality explosion
fn normalize_endpoint(path: &str) -> String {
    match path {
        "/health" | "/metrics" | "/admin/token-cache" => path.to_string(),
        _ if path.starts_with("/proxy/") => "/proxy/{proxy}".to_string(),
        _ => "/other".to_string(),
    }
}

// ============================================================================
// Gate Metrics
// ============================================================================

/// Record a request the gate rejected.
///
/// Metric: `gw_auth_rejections_total`
/// Labels: `status_code`
pub fn record_auth_rejection(status_code: u16) {
    counter!("gw_auth_rejections_total",
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

/// Record the final gate outcome for a request.
///
/// Metric: `gw_auth_requests_total`
/// Labels: `outcome` (authorized, bypassed, rejected)
pub fn record_auth_outcome(outcome: &'static str) {
    counter!("gw_auth_requests_total", "outcome" => outcome).increment(1);
}

/// Record a token cache lookup.
///
/// Metric: `gw_token_cache_lookups_total`
/// Labels: `result` (hit, miss, expired, bypassed)
pub fn record_token_cache_lookup(result: &'static str) {
    counter!("gw_token_cache_lookups_total", "result" => result).increment(1);
}

/// Set the current number of cached tokens.
///
/// Metric: `gw_token_cache_entries`
pub fn set_token_cache_size(size: usize) {
    gauge!("gw_token_cache_entries").set(size as f64);
}

/// Record an API-key exchange call.
///
/// Metric: `gw_api_key_exchange_total`, `gw_api_key_exchange_duration_seconds`
/// Labels: `status` (success, denied, unavailable, error)
pub fn record_api_key_exchange(status: &'static str, duration: Duration) {
    histogram!("gw_api_key_exchange_duration_seconds", "status" => status)
        .record(duration.as_secs_f64());
    counter!("gw_api_key_exchange_total", "status" => status).increment(1);
}
