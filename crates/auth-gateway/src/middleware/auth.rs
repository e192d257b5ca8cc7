//! Gate middleware for proxied routes.
//!
//! Runs [`AuthGate`] on the request headers. On success the request
//! continues with credentials stripped, the claims header set and an
//! [`AuthenticatedClaims`] extension for authorized requests. On failure
//! the error responder produces the response and the request stops here.

use crate::auth::pipeline::{AuthGate, AuthOutcome, GateRequest};
use crate::auth::propagation::strip_inbound_claims;
use crate::auth::DecodedToken;
use crate::errors::{self, RequestContext};
use crate::middleware::target_proxy::TargetProxy;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::instrument;

/// Verified token of an authorized request, for handlers behind the gate.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticatedClaims(pub DecodedToken);

/// Authenticate and authorize the request against its [`TargetProxy`].
///
/// # Response
///
/// - Continues to the next handler when the gate lets the request through
/// - Otherwise returns the gate error (400/401/403/504/500)
#[instrument(skip_all, name = "gw.middleware.auth")]
pub async fn require_gateway_auth(
    State(gate): State<Arc<AuthGate>>,
    req: Request,
    next: Next,
) -> Response {
    let proxy = req.extensions().get::<TargetProxy>().cloned();
    let proxy = proxy.as_ref().map(TargetProxy::as_str);
    let ctx = RequestContext::from_request(&req, proxy);

    let (mut parts, body) = req.into_parts();
    strip_inbound_claims(&mut parts.headers);

    let result = gate
        .authenticate(GateRequest {
            headers: &mut parts.headers,
            uri: &parts.uri,
            proxy,
        })
        .await;

    match result {
        Ok(outcome) => {
            if let AuthOutcome::Authorized(token) = outcome {
                parts.extensions.insert(AuthenticatedClaims(*token));
            }
            next.run(Request::from_parts(parts, body)).await
        }
        Err(err) => errors::respond(&err, &ctx),
    }
}
