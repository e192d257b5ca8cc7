//! Middleware for the auth gateway.
//!
//! # Components
//!
//! - `auth` - runs the gate in front of proxied routes
//! - `http_metrics` - HTTP request metrics for every response
//! - `target_proxy` - attaches the target proxy name to the request

pub mod auth;
pub mod http_metrics;
pub mod target_proxy;

pub use auth::{require_gateway_auth, AuthenticatedClaims};
pub use http_metrics::http_metrics_middleware;
pub use target_proxy::{set_target_proxy, TargetProxy};
