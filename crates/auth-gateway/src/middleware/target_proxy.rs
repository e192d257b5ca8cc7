//! Target proxy resolution.
//!
//! The router knows which backend a request is for; the gate needs it for
//! the authorization check. This layer copies the `:proxy` path parameter
//! into a [`TargetProxy`] request extension.

use axum::{
    extract::{Path, Request},
    middleware::Next,
    response::Response,
};
use std::collections::HashMap;

/// Path parameter naming the backend.
pub const PROXY_PATH_PARAM: &str = "proxy";

/// Name of the backend route a request targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetProxy(pub String);

impl TargetProxy {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Insert [`TargetProxy`] from the matched route's `:proxy` parameter.
///
/// Must be added with `route_layer` so path parameters are available.
pub async fn set_target_proxy(
    Path(params): Path<HashMap<String, String>>,
    mut req: Request,
    next: Next,
) -> Response {
    if let Some(proxy) = params.get(PROXY_PATH_PARAM) {
        req.extensions_mut().insert(TargetProxy(proxy.clone()));
    }
    next.run(req).await
}
