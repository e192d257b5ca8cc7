//! API gateway authentication gate.
//!
//! Establishes the caller's identity from a bearer token or an API key,
//! verifies it, checks it against the product → proxy policy and forwards a
//! sanitized claim set to the backend. Everything else is rejected with a
//! stable error code.
//!
//! # Architecture
//!
//! ```text
//! routes/mod.rs -> middleware/*.rs -> auth::pipeline -> auth/*.rs
//! ```
//!
//! # Modules
//!
//! - `auth` - gate components and the pipeline
//! - `config` - service configuration from environment
//! - `errors` - error taxonomy and the error responder
//! - `handlers` - health, metrics, admin and upstream handlers
//! - `middleware` - axum layers running the gate
//! - `observability` - metrics
//! - `routes` - axum routers

pub mod auth;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod routes;
