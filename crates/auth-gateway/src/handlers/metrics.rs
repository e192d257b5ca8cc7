//! Prometheus metrics endpoint handler.
//!
//! # Security
//!
//! Served on the admin listener only. Labels are bounded; no API keys,
//! tokens or claim values are ever recorded.

use axum::{extract::State, response::IntoResponse};
use metrics_exporter_prometheus::PrometheusHandle;

/// Handler for GET /metrics
///
/// Returns Prometheus text format:
/// ```text
/// # TYPE gw_auth_rejections_total counter
/// gw_auth_rejections_total{status_code="401"} 7
/// ```
#[tracing::instrument(skip_all, name = "gw.metrics.scrape")]
pub async fn metrics_handler(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    handle.render()
}
