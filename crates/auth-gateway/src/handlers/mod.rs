//! HTTP request handlers for the auth gateway.

pub mod admin;
pub mod health;
pub mod metrics;
pub mod upstream;

pub use admin::{clear_token_cache, token_cache_size};
pub use health::health_check;
pub use metrics::metrics_handler;
pub use upstream::upstream_echo;
