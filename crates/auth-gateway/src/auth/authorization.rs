//! Product to proxy authorization.
//!
//! A token grants access to a proxy when one of its products maps to that
//! proxy in the configured policy. Names match exactly; there are no
//! wildcards, and a token without products is never authorized.

use crate::auth::claims::DecodedToken;
use crate::errors::AuthError;
use std::collections::{HashMap, HashSet};

/// Immutable product → proxies policy.
#[derive(Debug, Clone, Default)]
pub struct AuthorizationPolicy {
    product_to_proxy: HashMap<String, HashSet<String>>,
}

impl AuthorizationPolicy {
    pub fn new(product_to_proxy: HashMap<String, Vec<String>>) -> Self {
        Self {
            product_to_proxy: product_to_proxy
                .into_iter()
                .map(|(product, proxies)| (product, proxies.into_iter().collect()))
                .collect(),
        }
    }

    pub fn is_authorized(&self, token: &DecodedToken, proxy: &str) -> bool {
        token.products().iter().any(|product| {
            self.product_to_proxy
                .get(product)
                .is_some_and(|proxies| proxies.contains(proxy))
        })
    }

    /// Authorize `token` for `proxy`.
    ///
    /// # Errors
    ///
    /// Returns `AccessDenied` when no product grants the proxy, or when the
    /// request carries no target proxy at all.
    pub fn check(&self, token: &DecodedToken, proxy: Option<&str>) -> Result<(), AuthError> {
        let Some(proxy) = proxy else {
            tracing::warn!(target: "auth_gateway.auth.authorization", "Request has no target proxy");
            return Err(AuthError::AccessDenied("Path not authorized".to_string()));
        };

        if self.is_authorized(token, proxy) {
            Ok(())
        } else {
            tracing::debug!(
                target: "auth_gateway.auth.authorization",
                proxy = %proxy,
                products = ?token.products(),
                "No product grants the target proxy"
            );
            Err(AuthError::AccessDenied(format!(
                "Path not authorized for proxy {}",
                proxy
            )))
        }
    }
}
