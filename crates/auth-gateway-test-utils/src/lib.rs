//! # Auth Gateway Test Utilities
//!
//! Shared test utilities for the auth gateway.
//!
//! This crate provides:
//! - Deterministic Ed25519 key fixtures (same seed, same key)
//! - A signed test-token builder
//! - A server harness running the real public and admin routers
//!
//! ## Usage
//!
//! ```rust,ignore
//! use auth_gateway_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() {
//!     let keypair = TestKeypair::new(1);
//!     let token = TestTokenBuilder::new()
//!         .products(&["gold"])
//!         .sign(&keypair);
//!
//!     let server = TestGatewayServer::builder()
//!         .public_key(&keypair)
//!         .product("gold", &["orders"])
//!         .spawn()
//!         .await?;
//! }
//! ```

pub mod crypto_fixtures;
pub mod server_harness;
pub mod token_builders;

pub use crypto_fixtures::*;
pub use server_harness::*;
pub use token_builders::*;
