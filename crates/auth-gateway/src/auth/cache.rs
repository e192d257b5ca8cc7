//! API-key token cache.
//!
//! Maps a raw API key to the token it was last exchanged for. Entries expire
//! lazily: nothing sweeps the map, an expired entry is removed when a lookup
//! finds it. The whole map sits behind one async mutex, so `clear` is atomic
//! with respect to concurrent lookups and stores.

use crate::auth::claims::DecodedToken;
use crate::observability::metrics;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::instrument;

/// Lifetime assigned to tokens cached without an `exp` claim.
pub const DEFAULT_TOKEN_TTL_SECONDS: u64 = 1800;

/// `cache-control` directive that bypasses the cache for one request.
pub const CACHE_CONTROL_BYPASS: &str = "no-cache";

/// Shared API-key → token cache. Cloning shares the same map.
#[derive(Clone, Default)]
pub struct TokenCache {
    entries: Arc<Mutex<HashMap<String, DecodedToken>>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the token for `key`, dropping the entry if it has expired.
    #[instrument(skip_all, name = "gw.cache.lookup")]
    pub async fn lookup(&self, key: &str) -> Option<DecodedToken> {
        self.lookup_at(key, chrono::Utc::now().timestamp()).await
    }

    pub(crate) async fn lookup_at(&self, key: &str, now: i64) -> Option<DecodedToken> {
        let mut entries = self.entries.lock().await;

        match entries.get(key) {
            None => {
                metrics::record_token_cache_lookup("miss");
                None
            }
            Some(token) if token.is_live_at(now) => {
                metrics::record_token_cache_lookup("hit");
                Some(token.clone())
            }
            Some(_) => {
                entries.remove(key);
                metrics::record_token_cache_lookup("expired");
                metrics::set_token_cache_size(entries.len());
                tracing::debug!(target: "auth_gateway.cache", "Evicted expired token");
                None
            }
        }
    }

    /// Store `token` under `key`.
    ///
    /// A token without `exp` is given `now + ttl_hint` seconds
    /// ([`DEFAULT_TOKEN_TTL_SECONDS`] when no hint is given).
    #[instrument(skip_all, name = "gw.cache.store")]
    pub async fn store(&self, key: &str, token: DecodedToken, ttl_hint: Option<u64>) {
        self.store_at(key, token, ttl_hint, chrono::Utc::now().timestamp())
            .await;
    }

    pub(crate) async fn store_at(
        &self,
        key: &str,
        mut token: DecodedToken,
        ttl_hint: Option<u64>,
        now: i64,
    ) {
        if !token.has_expiry() {
            let ttl = ttl_hint.unwrap_or(DEFAULT_TOKEN_TTL_SECONDS);
            token.exp = now.saturating_add(i64::try_from(ttl).unwrap_or(i64::MAX));
        }

        let mut entries = self.entries.lock().await;
        entries.insert(key.to_string(), token);
        metrics::set_token_cache_size(entries.len());
    }

    /// Number of entries, expired ones included until a lookup evicts them.
    pub async fn size(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Remove every entry and return how many were removed.
    pub async fn clear(&self) -> usize {
        let mut entries = self.entries.lock().await;
        let removed = entries.len();
        entries.clear();
        metrics::set_token_cache_size(0);
        removed
    }
}

/// Whether a `cache-control` value asks to bypass the cache.
pub fn bypasses_cache(cache_control: Option<&str>) -> bool {
    cache_control.is_some_and(|v| v.to_ascii_lowercase().contains(CACHE_CONTROL_BYPASS))
}
