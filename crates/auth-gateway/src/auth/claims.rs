//! Decoded token claims.
//!
//! [`DecodedToken`] is the verified claim set of a token. The claims the gate
//! relies on are typed fields; everything else is kept in an open map so it
//! can be forwarded unchanged. [`DownstreamClaims`] is the sanitized view that
//! reaches the backend.

use crate::errors::AuthError;
use axum::http::HeaderValue;
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Claim set of a verified token.
///
/// `application_name`, `client_id` and `iat` are private: the gate may use
/// them but they are never forwarded downstream. `client_id` is redacted in
/// Debug output.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecodedToken {
    /// Expiration timestamp (Unix epoch seconds). `0` means no `exp` claim.
    #[serde(default)]
    pub exp: i64,

    /// Products the caller is subscribed to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_product_list: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    /// Issued-at timestamp (Unix epoch seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Every other claim, forwarded as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl fmt::Debug for DecodedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedToken")
            .field("exp", &self.exp)
            .field("api_product_list", &self.api_product_list)
            .field("application_name", &self.application_name)
            .field("client_id", &self.client_id.as_ref().map(|_| "[REDACTED]"))
            .field("iat", &self.iat)
            .field("extra", &self.extra.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl DecodedToken {
    /// Products listed in the token. Absent and empty lists are the same.
    pub fn products(&self) -> &[String] {
        self.api_product_list.as_deref().unwrap_or(&[])
    }

    /// Whether the token carries an expiry.
    pub fn has_expiry(&self) -> bool {
        self.exp > 0
    }

    /// Still usable at `now`: valid only while `now < exp`.
    pub fn is_live_at(&self, now: i64) -> bool {
        !self.has_expiry() || now < self.exp
    }
}

/// The part of a [`DecodedToken`] forwarded to the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct DownstreamClaims(BTreeMap<String, Value>);

impl DownstreamClaims {
    /// Drop private claims and collect the rest with sorted keys.
    pub fn from_token(token: &DecodedToken) -> Self {
        // Destructured so a new typed claim cannot silently leak downstream.
        let DecodedToken {
            exp,
            api_product_list,
            application_name: _,
            client_id: _,
            iat: _,
            extra,
        } = token;

        let mut claims: BTreeMap<String, Value> = extra
            .iter()
            .filter(|(name, _)| !is_private_claim(name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        if *exp > 0 {
            claims.insert("exp".to_string(), Value::from(*exp));
        }
        if let Some(products) = api_product_list {
            claims.insert(
                "api_product_list".to_string(),
                Value::from(products.clone()),
            );
        }

        Self(claims)
    }

    /// Claim names in forwarding order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    #[cfg(test)]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn as_map(&self) -> &BTreeMap<String, Value> {
        &self.0
    }

    /// Canonical JSON: keys sorted, no insignificant whitespace.
    pub fn to_json(&self) -> Result<String, AuthError> {
        serde_json::to_string(&self.0)
            .map_err(|e| AuthError::Internal(format!("claims serialization failed: {}", e)))
    }

    /// Base64 (standard alphabet, padded) of the canonical JSON.
    pub fn encode(&self) -> Result<String, AuthError> {
        Ok(STANDARD.encode(self.to_json()?))
    }

    pub fn to_header_value(&self) -> Result<HeaderValue, AuthError> {
        HeaderValue::from_str(&self.encode()?)
            .map_err(|e| AuthError::Internal(format!("claims header invalid: {}", e)))
    }

    /// Decode a header value produced by [`DownstreamClaims::encode`].
    pub fn decode(encoded: &str) -> Option<Self> {
        let bytes = STANDARD.decode(encoded).ok()?;
        serde_json::from_slice(&bytes).ok().map(Self)
    }
}

/// Private claim names. Matches the typed fields so a claim smuggled through
/// the open map under one of these names is dropped too.
fn is_private_claim(name: &str) -> bool {
    matches!(name, "application_name" | "client_id" | "iat")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_token() -> DecodedToken {
        serde_json::from_value(json!({
            "exp": 1_900_000_000_i64,
            "iat": 1_800_000_000_i64,
            "client_id": "client-secret-id",
            "application_name": "orders-app",
            "api_product_list": ["gold", "silver"],
            "scopes": ["read"],
            "developer_email": "dev@example.com"
        }))
        .unwrap()
    }

    #[test]
    fn test_deserialize_splits_typed_and_open_claims() {
        let token = sample_token();

        assert_eq!(token.exp, 1_900_000_000);
        assert_eq!(token.iat, Some(1_800_000_000));
        assert_eq!(token.client_id.as_deref(), Some("client-secret-id"));
        assert_eq!(token.application_name.as_deref(), Some("orders-app"));
        assert_eq!(token.products(), ["gold".to_string(), "silver".to_string()]);
        assert_eq!(token.extra.len(), 2);
        assert_eq!(token.extra["developer_email"], "dev@example.com");
    }

    #[test]
    fn test_missing_product_list_is_empty() {
        let token: DecodedToken = serde_json::from_value(json!({"exp": 10})).unwrap();
        assert!(token.products().is_empty());
        assert!(token.api_product_list.is_none());
    }

    #[test]
    fn test_debug_redacts_client_id() {
        let debug = format!("{:?}", sample_token());

        assert!(!debug.contains("client-secret-id"));
        assert!(!debug.contains("dev@example.com"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_is_live_at() {
        let token = DecodedToken {
            exp: 100,
            ..DecodedToken::default()
        };
        assert!(token.is_live_at(99));
        assert!(!token.is_live_at(100));
        assert!(!token.is_live_at(101));

        let no_expiry = DecodedToken::default();
        assert!(no_expiry.is_live_at(i64::MAX));
    }

    #[test]
    fn test_downstream_claims_strip_private_claims() {
        let claims = DownstreamClaims::from_token(&sample_token());

        let names: Vec<&str> = claims.names().collect();
        assert_eq!(
            names,
            vec!["api_product_list", "developer_email", "exp", "scopes"]
        );
        assert!(claims.get("client_id").is_none());
        assert!(claims.get("application_name").is_none());
        assert!(claims.get("iat").is_none());
    }

    #[test]
    fn test_downstream_json_is_canonical() {
        let claims = DownstreamClaims::from_token(&sample_token());

        assert_eq!(
            claims.to_json().unwrap(),
            r#"{"api_product_list":["gold","silver"],"developer_email":"dev@example.com","exp":1900000000,"scopes":["read"]}"#
        );
    }

    #[test]
    fn test_encode_uses_padded_standard_base64() {
        let token = DecodedToken {
            exp: 10,
            ..DecodedToken::default()
        };
        let encoded = DownstreamClaims::from_token(&token).encode().unwrap();

        assert_eq!(encoded, "eyJleHAiOjEwfQ==");
        assert_eq!(STANDARD.decode(&encoded).unwrap(), br#"{"exp":10}"#);
    }

    #[test]
    fn test_decode_reverses_encode() {
        let claims = DownstreamClaims::from_token(&sample_token());
        let decoded = DownstreamClaims::decode(&claims.encode().unwrap()).unwrap();

        assert_eq!(decoded, claims);
        assert!(DownstreamClaims::decode("%%%").is_none());
    }
}
