//! Stand-in upstream.
//!
//! The forwarding hop is not part of the gateway; this handler answers in
//! its place with what the backend would receive.

use crate::auth::{DownstreamClaims, CLAIMS_HEADER};
use crate::middleware::target_proxy::TargetProxy;
use axum::{
    http::{HeaderMap, Uri},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// What the backend would see.
#[derive(Debug, Serialize, Deserialize)]
pub struct UpstreamEcho {
    pub proxy: Option<String>,
    pub path: String,
    /// Decoded `x-authorization-claims`, absent for unauthenticated requests.
    pub claims: Option<BTreeMap<String, Value>>,
    /// Forwarded header names, sorted.
    pub headers: Vec<String>,
}

/// Handler for ANY /proxy/:proxy/*path
pub async fn upstream_echo(
    proxy: Option<Extension<TargetProxy>>,
    uri: Uri,
    headers: HeaderMap,
) -> Json<UpstreamEcho> {
    let claims = headers
        .get(CLAIMS_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(DownstreamClaims::decode)
        .map(|c| c.as_map().clone());

    let mut names: Vec<String> = headers.keys().map(|k| k.as_str().to_string()).collect();
    names.sort();
    names.dedup();

    Json(UpstreamEcho {
        proxy: proxy.map(|Extension(p)| p.0),
        path: uri.path().to_string(),
        claims,
        headers: names,
    })
}
