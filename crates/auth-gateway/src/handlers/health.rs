//! Liveness probe.

/// Handler for GET /health
#[tracing::instrument(skip_all, name = "gw.health.check")]
pub async fn health_check() -> &'static str {
    "OK"
}
