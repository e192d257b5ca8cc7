//! Observability for the auth gateway.
//!
//! Metric definitions and the Prometheus recorder setup.

pub mod metrics;
