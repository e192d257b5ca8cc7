//! Builder for signed test tokens.

use crate::crypto_fixtures::TestKeypair;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, Header};
use serde_json::{Map, Value};

/// Builder for EdDSA-signed test tokens.
///
/// # Example
/// ```rust,ignore
/// let token = TestTokenBuilder::new()
///     .products(&["gold"])
///     .client_id("client-1")
///     .claim("tier", "premium")
///     .sign(&TestKeypair::new(1));
/// ```
pub struct TestTokenBuilder {
    exp: Option<i64>,
    iat: Option<i64>,
    claims: Map<String, Value>,
}

impl TestTokenBuilder {
    /// Token valid for an hour, issued now, without products.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            exp: Some((now + Duration::seconds(3600)).timestamp()),
            iat: Some(now.timestamp()),
            claims: Map::new(),
        }
    }

    /// Set `api_product_list`.
    pub fn products(mut self, products: &[&str]) -> Self {
        self.claims.insert(
            "api_product_list".to_string(),
            Value::from(products.iter().map(|p| p.to_string()).collect::<Vec<_>>()),
        );
        self
    }

    pub fn client_id(mut self, client_id: &str) -> Self {
        self.claims
            .insert("client_id".to_string(), Value::from(client_id));
        self
    }

    pub fn application_name(mut self, name: &str) -> Self {
        self.claims
            .insert("application_name".to_string(), Value::from(name));
        self
    }

    /// Set an arbitrary claim.
    pub fn claim(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.claims.insert(name.to_string(), value.into());
        self
    }

    /// Expire an hour ago.
    pub fn expired(self) -> Self {
        self.expires_at((Utc::now() - Duration::seconds(3600)).timestamp())
    }

    pub fn expires_in(self, seconds: i64) -> Self {
        self.expires_at((Utc::now() + Duration::seconds(seconds)).timestamp())
    }

    pub fn expires_at(mut self, timestamp: i64) -> Self {
        self.exp = Some(timestamp);
        self
    }

    /// Omit `exp`.
    pub fn without_exp(mut self) -> Self {
        self.exp = None;
        self
    }

    pub fn issued_at(mut self, timestamp: i64) -> Self {
        self.iat = Some(timestamp);
        self
    }

    /// The claims as a JSON object.
    pub fn build(self) -> Value {
        let mut claims = self.claims;
        if let Some(exp) = self.exp {
            claims.insert("exp".to_string(), Value::from(exp));
        }
        if let Some(iat) = self.iat {
            claims.insert("iat".to_string(), Value::from(iat));
        }
        Value::Object(claims)
    }

    /// Sign with `keypair` (EdDSA).
    pub fn sign(self, keypair: &TestKeypair) -> String {
        encode(
            &Header::new(Algorithm::EdDSA),
            &self.build(),
            &keypair.encoding_key(),
        )
        .expect("test token signing")
    }
}

impl Default for TestTokenBuilder {
    fn default() -> Self {
        Self::new()
    }
}
