//! Claims propagation to the backend.

use crate::auth::claims::{DecodedToken, DownstreamClaims};
use crate::errors::AuthError;
use axum::http::HeaderMap;

/// Header carrying the sanitized claims downstream.
pub const CLAIMS_HEADER: &str = "x-authorization-claims";

/// Remove any claims header the client sent itself.
pub fn strip_inbound_claims(headers: &mut HeaderMap) {
    if headers.remove(CLAIMS_HEADER).is_some() {
        tracing::warn!(
            target: "auth_gateway.auth.propagation",
            "Dropped client-supplied claims header"
        );
    }
}

/// Set the claims header for `token`, replacing any existing value.
pub fn propagate(headers: &mut HeaderMap, token: &DecodedToken) -> Result<(), AuthError> {
    let claims = DownstreamClaims::from_token(token);
    let value = claims.to_header_value()?;
    tracing::debug!(
        target: "auth_gateway.auth.propagation",
        claims = ?claims.names().collect::<Vec<_>>(),
        "Forwarding claims"
    );
    headers.insert(CLAIMS_HEADER, value);
    Ok(())
}
