//! API-key exchange.
//!
//! Resolves an API key to a token by calling the configured verification
//! endpoint. The cache is handled by the pipeline; this module only makes
//! the call.
//!
//! # Security
//!
//! - The key travels in a sensitive header and the JSON body, never the URL
//! - A transport timeout bounds every call
//! - No retry; a failed exchange fails the request

use crate::config::{Config, ConfigError};
use crate::errors::AuthError;
use crate::observability::metrics;
use async_trait::async_trait;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use common::secret::{key_hint, ExposeSecret, SecretString};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{instrument, warn};

/// Connect timeout for the verification endpoint.
const CONNECT_TIMEOUT_SECS: u64 = 5;

const GATEWAY_TIMEOUT_MESSAGE: &str = "Gateway Timeout";

/// Turns an API key into a raw token.
#[async_trait]
pub trait ApiKeyExchange: Send + Sync {
    /// Exchange `api_key` for a token.
    ///
    /// # Errors
    ///
    /// - `InvalidRequest` - no verification endpoint configured
    /// - `GatewayTimeout` - transport failure or 5xx from the endpoint
    /// - `AccessDenied` - any other non-200 response
    /// - `InvalidToken` - 200 response without a usable token
    async fn exchange(&self, api_key: &SecretString) -> Result<SecretString, AuthError>;
}

#[derive(Serialize)]
struct ExchangeRequest<'a> {
    #[serde(rename = "apiKey")]
    api_key: &'a str,
}

/// Exchanger backed by an HTTP verification endpoint.
#[derive(Clone)]
pub struct HttpApiKeyExchanger {
    client: Client,
    url: Option<String>,
    key_header: HeaderName,
}

impl HttpApiKeyExchanger {
    /// Create an exchanger.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::HttpClient` if the HTTP client cannot be built.
    pub fn new(
        url: Option<String>,
        key_header: HeaderName,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS).min(timeout))
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self {
            client,
            url,
            key_header,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Self::new(
            config.verify_api_key_url.clone(),
            config.api_key_exchange_header.clone(),
            Duration::from_secs(config.api_key_exchange_timeout_seconds),
        )
    }
}

#[async_trait]
impl ApiKeyExchange for HttpApiKeyExchanger {
    #[instrument(skip_all, name = "gw.auth.exchange")]
    async fn exchange(&self, api_key: &SecretString) -> Result<SecretString, AuthError> {
        let Some(url) = self.url.as_deref() else {
            warn!(target: "auth_gateway.auth.exchange", "API key presented but no verification endpoint is configured");
            return Err(AuthError::InvalidRequest(
                "API key verification is not configured".to_string(),
            ));
        };

        let mut key_value = HeaderValue::from_str(api_key.expose_secret())
            .map_err(|_| AuthError::InvalidAuthorization("Invalid API key".to_string()))?;
        key_value.set_sensitive(true);

        let start = Instant::now();
        let response = self
            .client
            .post(url)
            .header(self.key_header.clone(), key_value)
            .json(&ExchangeRequest {
                api_key: api_key.expose_secret(),
            })
            .send()
            .await
            .map_err(|e| {
                warn!(target: "auth_gateway.auth.exchange", error = %e, "Verification endpoint unreachable");
                metrics::record_api_key_exchange("unavailable", start.elapsed());
                AuthError::GatewayTimeout(GATEWAY_TIMEOUT_MESSAGE.to_string())
            })?;

        let status = response.status();

        if status == StatusCode::OK {
            let body = response.text().await.map_err(|e| {
                warn!(target: "auth_gateway.auth.exchange", error = %e, "Failed to read verification response");
                metrics::record_api_key_exchange("unavailable", start.elapsed());
                AuthError::GatewayTimeout(GATEWAY_TIMEOUT_MESSAGE.to_string())
            })?;
            metrics::record_api_key_exchange("success", start.elapsed());
            parse_exchange_body(&body)
        } else if status.is_server_error() {
            warn!(target: "auth_gateway.auth.exchange", status = %status, "Verification endpoint returned server error");
            metrics::record_api_key_exchange("unavailable", start.elapsed());
            Err(AuthError::GatewayTimeout(GATEWAY_TIMEOUT_MESSAGE.to_string()))
        } else {
            tracing::info!(
                target: "auth_gateway.auth.exchange",
                status = %status,
                key = %key_hint(api_key),
                "API key rejected"
            );
            metrics::record_api_key_exchange("denied", start.elapsed());
            Err(AuthError::AccessDenied(reason_phrase(&response)))
        }
    }
}

/// The status text the remote sent, else the canonical one.
fn reason_phrase(response: &reqwest::Response) -> String {
    if let Some(phrase) = response.extensions().get::<hyper::ext::ReasonPhrase>() {
        return String::from_utf8_lossy(phrase.as_bytes()).into_owned();
    }
    response
        .status()
        .canonical_reason()
        .unwrap_or("Access Denied")
        .to_string()
}

/// Extract the token from a 200 response body.
///
/// Accepts a JSON object with a string `token` field, a JSON string, or the
/// raw token text.
pub fn parse_exchange_body(body: &str) -> Result<SecretString, AuthError> {
    let trimmed = body.trim();

    let token = match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(fields)) => fields
            .get("token")
            .and_then(Value::as_str)
            .map(str::to_string),
        Ok(Value::String(token)) => Some(token),
        _ => Some(trimmed.to_string()),
    };

    token
        .filter(|t| !t.trim().is_empty())
        .map(SecretString::from)
        .ok_or_else(|| {
            warn!(target: "auth_gateway.auth.exchange", "Verification response carried no token");
            AuthError::InvalidToken("The access token is invalid".to_string())
        })
}

/// Mock exchanger for unit testing.
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Mock exchanger returning a fixed outcome.
    pub struct MockApiKeyExchanger {
        outcome: Result<String, AuthError>,
        call_count: AtomicUsize,
    }

    impl MockApiKeyExchanger {
        /// Create a mock that always returns `token`.
        pub fn returning(token: impl Into<String>) -> Self {
            Self {
                outcome: Ok(token.into()),
                call_count: AtomicUsize::new(0),
            }
        }

        /// Create a mock that always fails with `error`.
        pub fn failing(error: AuthError) -> Self {
            Self {
                outcome: Err(error),
                call_count: AtomicUsize::new(0),
            }
        }

        /// Get the number of calls made.
        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ApiKeyExchange for MockApiKeyExchanger {
        async fn exchange(&self, _api_key: &SecretString) -> Result<SecretString, AuthError> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            self.outcome.clone().map(SecretString::from)
        }
    }
}
