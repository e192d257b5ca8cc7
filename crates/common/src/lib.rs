//! Common utilities shared across the auth gateway crates.

#![warn(clippy::pedantic)]

/// Module for secret types that prevent accidental logging
pub mod secret;

/// Module for JWT pre-parse guards (size limit, header inspection, iat skew)
pub mod jwt;
