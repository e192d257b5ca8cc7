//! JWT pre-parse guards shared by the gateway's token verifier.
//!
//! Everything in here runs BEFORE any signature verification:
//! - Size limit for DoS prevention
//! - Header inspection (`alg`) without trusting the token
//! - `iat` validation with clock skew tolerance
//! - PEM normalization for keys supplied through environment variables
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE base64 decoding
//! - Header values are only used for diagnostics and early rejection,
//!   never to choose the verification algorithm
//! - Error messages are intentionally generic
//!
//! # Usage
//!
//! ```rust,ignore
//! use common::jwt::{check_token_size, extract_alg, validate_iat, DEFAULT_CLOCK_SKEW};
//!
//! check_token_size(token)?;
//! let alg = extract_alg(token)?;
//! // ... verify signature with the configured algorithm ...
//! validate_iat(iat, DEFAULT_CLOCK_SKEW)?;
//! ```

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Maximum allowed JWT size in bytes (8KB).
///
/// Bearer tokens and exchanged API-key tokens larger than this are rejected
/// before any base64 decoding or cryptographic work.
///
/// Typical gateway tokens carry a product list and a handful of standard
/// claims and stay well under 2KB.
pub const MAX_JWT_SIZE_BYTES: usize = 8192; // 8KB

/// Default JWT clock skew tolerance for `iat` (5 minutes).
///
/// Tokens with `iat` more than this amount in the future are rejected.
pub const DEFAULT_CLOCK_SKEW: Duration = Duration::from_secs(300);

/// Maximum allowed JWT clock skew tolerance (10 minutes).
///
/// Also the upper bound for the expiry leeway.
pub const MAX_CLOCK_SKEW: Duration = Duration::from_secs(600);

// =============================================================================
// Error Types
// =============================================================================

/// Errors raised by the pre-parse guards.
///
/// Display strings are intentionally generic. Detailed information is logged
/// at debug level.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JwtValidationError {
    /// Token size exceeds maximum allowed.
    #[error("The access token is invalid")]
    TokenTooLarge,

    /// Token format is invalid (not a valid compact JWS structure).
    #[error("The access token is invalid")]
    MalformedToken,

    /// Token header has no usable `alg` field.
    #[error("The access token is invalid")]
    MissingAlgorithm,

    /// Token `iat` claim is too far in the future.
    #[error("The access token is invalid")]
    IatTooFarInFuture,
}

// =============================================================================
// Functions
// =============================================================================

/// Reject tokens larger than [`MAX_JWT_SIZE_BYTES`].
///
/// # Errors
///
/// Returns `JwtValidationError::TokenTooLarge` when the token is oversized.
pub fn check_token_size(token: &str) -> Result<(), JwtValidationError> {
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "common.jwt",
            token_size = token.len(),
            max_size = MAX_JWT_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(JwtValidationError::TokenTooLarge);
    }
    Ok(())
}

/// Extract the `alg` value from a JWT header without verifying the signature.
///
/// The verifier uses this to reject tokens signed with an unexpected
/// algorithm before doing any key work, and to log what was presented.
///
/// # Security
///
/// - Token size is checked BEFORE any parsing
/// - The returned value must never be used to pick the verification algorithm
///
/// # Errors
///
/// - `TokenTooLarge` - Token exceeds size limit
/// - `MalformedToken` - Wrong structure, bad base64, or invalid JSON
/// - `MissingAlgorithm` - Header missing `alg`, or `alg` is not a non-empty string
pub fn extract_alg(token: &str) -> Result<String, JwtValidationError> {
    check_token_size(token)?;

    // JWT format: header.payload.signature
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        tracing::debug!(
            target: "common.jwt",
            parts = parts.len(),
            "Token rejected: invalid JWT format"
        );
        return Err(JwtValidationError::MalformedToken);
    }

    let header_part = parts.first().ok_or(JwtValidationError::MalformedToken)?;
    let header_bytes = URL_SAFE_NO_PAD.decode(header_part).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to decode JWT header base64");
        JwtValidationError::MalformedToken
    })?;

    let header: serde_json::Value = serde_json::from_slice(&header_bytes).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to parse JWT header JSON");
        JwtValidationError::MalformedToken
    })?;

    header
        .get("alg")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .ok_or(JwtValidationError::MissingAlgorithm)
}

/// Validate the `iat` (issued-at) claim with clock skew tolerance.
///
/// # Errors
///
/// Returns `JwtValidationError::IatTooFarInFuture` if `iat` is more than
/// `clock_skew` in the future.
pub fn validate_iat(iat: i64, clock_skew: Duration) -> Result<(), JwtValidationError> {
    let now = chrono::Utc::now().timestamp();
    validate_iat_at(iat, clock_skew, now)
}

/// Deterministic `iat` validation against an explicit `now` timestamp.
pub(crate) fn validate_iat_at(
    iat: i64,
    clock_skew: Duration,
    now: i64,
) -> Result<(), JwtValidationError> {
    // Safe cast: clock_skew is bounded to MAX_CLOCK_SKEW (600 seconds)
    #[allow(clippy::cast_possible_wrap)]
    let clock_skew_secs = clock_skew.as_secs() as i64;
    let max_iat = now + clock_skew_secs;

    if iat > max_iat {
        tracing::debug!(
            target: "common.jwt",
            iat = iat,
            now = now,
            max_allowed = max_iat,
            "Token rejected: iat too far in the future"
        );
        return Err(JwtValidationError::IatTooFarInFuture);
    }

    Ok(())
}

/// Normalize a PEM document supplied through configuration.
///
/// Keys passed in environment variables frequently arrive with literal `\n`
/// sequences instead of line breaks, or with surrounding whitespace. PEM
/// parsers reject both, so this turns them back into a well-formed document.
#[must_use]
pub fn normalize_pem(pem: &str) -> String {
    let unescaped = pem.trim().replace("\\n", "\n");
    let mut lines: Vec<&str> = unescaped
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    lines.push("");
    lines.join("\n")
}

// =============================================================================
// Tests
// =============================================================================
