//! Administrative token cache endpoints.
//!
//! Served on the admin listener, never on the public proxy port.

use crate::routes::AppState;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenCacheSize {
    pub size: usize,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenCacheCleared {
    pub removed: usize,
}

/// Handler for GET /admin/token-cache
///
/// Expired entries count until a lookup evicts them.
#[instrument(skip_all, name = "gw.admin.cache_size")]
pub async fn token_cache_size(State(state): State<Arc<AppState>>) -> Json<TokenCacheSize> {
    Json(TokenCacheSize {
        size: state.gate.cache().size().await,
    })
}

/// Handler for DELETE /admin/token-cache
#[instrument(skip_all, name = "gw.admin.cache_clear")]
pub async fn clear_token_cache(State(state): State<Arc<AppState>>) -> Json<TokenCacheCleared> {
    let removed = state.gate.cache().clear().await;
    tracing::info!(target: "auth_gateway.admin", removed, "Token cache cleared");
    Json(TokenCacheCleared { removed })
}
