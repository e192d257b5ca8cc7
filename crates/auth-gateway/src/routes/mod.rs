//! HTTP routes for the auth gateway.
//!
//! Two routers, served on separate listeners:
//!
//! - public: `/health` and the gated `/proxy/:proxy/*path` routes
//! - admin: `/metrics` and `/admin/token-cache`

use crate::auth::AuthGate;
use crate::config::Config;
use crate::handlers;
use crate::middleware::{http_metrics_middleware, require_gateway_auth, set_target_proxy};
use axum::{
    middleware,
    routing::{any, get},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// Request timeout for both routers.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Service configuration.
    pub config: Config,

    /// The gate, owning the token cache.
    pub gate: Arc<AuthGate>,
}

/// Build the public router.
///
/// Layer order on proxied routes (outermost first):
/// 1. http_metrics_middleware - records every response
/// 2. TimeoutLayer
/// 3. TraceLayer
/// 4. set_target_proxy - attaches `TargetProxy`
/// 5. require_gateway_auth - runs the gate
pub fn build_routes(state: Arc<AppState>) -> Router {
    let health_routes = Router::new().route("/health", get(handlers::health_check));

    let proxied_routes = Router::new()
        .route("/proxy/:proxy", any(handlers::upstream_echo))
        .route("/proxy/:proxy/*path", any(handlers::upstream_echo))
        .route_layer(middleware::from_fn_with_state(
            state.gate.clone(),
            require_gateway_auth,
        ))
        // Added last so it runs before the gate
        .route_layer(middleware::from_fn(set_target_proxy));

    health_routes
        .merge(proxied_routes)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(middleware::from_fn(http_metrics_middleware))
}

/// Build the admin router.
pub fn build_admin_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    let cache_routes = Router::new()
        .route(
            "/admin/token-cache",
            get(handlers::token_cache_size).delete(handlers::clear_token_cache),
        )
        .with_state(state);

    metrics_routes
        .merge(cache_routes)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(middleware::from_fn(http_metrics_middleware))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_state_is_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<AppState>();
    }
}
