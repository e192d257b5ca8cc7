//! Credential resolution.
//!
//! Finds the one credential a request carries: a bearer token in the
//! authorization header, else an API key in the API-key header, else an API
//! key in the query string. Both credential headers are removed from the
//! request so neither reaches the backend.

use crate::config::Config;
use crate::errors::AuthError;
use axum::extract::Query;
use axum::http::{HeaderMap, HeaderName, Uri};
use common::secret::SecretString;

const BEARER_PREFIX: &str = "Bearer ";

/// The credential presented by a request. Raw values stay redacted in Debug.
#[derive(Debug, Clone)]
pub enum Credential {
    BearerToken(SecretString),
    ApiKey(SecretString),
}

impl Credential {
    pub fn kind(&self) -> &'static str {
        match self {
            Credential::BearerToken(_) => "bearer",
            Credential::ApiKey(_) => "api_key",
        }
    }
}

/// Result of resolving a request's credential.
#[derive(Debug, Clone)]
pub enum Resolution {
    Found(Credential),
    /// No credential and anonymous access is allowed.
    Anonymous,
}

/// Which credential types the resolver accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CredentialMode {
    #[default]
    Any,
    BearerOnly,
    ApiKeyOnly,
}

#[derive(Debug, Clone)]
pub struct CredentialResolver {
    authorization_header: HeaderName,
    api_key_header: HeaderName,
    allow_no_authorization: bool,
    mode: CredentialMode,
}

impl CredentialResolver {
    pub fn new(
        authorization_header: HeaderName,
        api_key_header: HeaderName,
        allow_no_authorization: bool,
        mode: CredentialMode,
    ) -> Self {
        Self {
            authorization_header,
            api_key_header,
            allow_no_authorization,
            mode,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let mode = if config.allow_oauth_only {
            CredentialMode::BearerOnly
        } else if config.allow_api_key_only {
            CredentialMode::ApiKeyOnly
        } else {
            CredentialMode::Any
        };

        Self::new(
            config.authorization_header.clone(),
            config.api_key_header.clone(),
            config.allow_no_authorization,
            mode,
        )
    }

    /// Resolve the request's credential and strip credential headers.
    ///
    /// # Errors
    ///
    /// - `InvalidRequest` - authorization header is not `Bearer <token>`, or
    ///   the query string cannot be parsed
    /// - `InvalidAuthorization` - credential type disabled, or empty API key
    /// - `MissingAuthorization` - no credential and anonymous access disabled
    pub fn resolve(&self, headers: &mut HeaderMap, uri: &Uri) -> Result<Resolution, AuthError> {
        let authorization = headers.remove(&self.authorization_header);
        let api_key_header = headers.remove(&self.api_key_header);

        if let Some(value) = authorization {
            let token = value
                .to_str()
                .ok()
                .and_then(|v| v.strip_prefix(BEARER_PREFIX))
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .ok_or_else(|| {
                    tracing::debug!(
                        target: "auth_gateway.auth.credentials",
                        "Authorization header is not a bearer token"
                    );
                    AuthError::InvalidRequest("Invalid Authorization header".to_string())
                })?;

            if self.mode == CredentialMode::ApiKeyOnly {
                return Err(AuthError::InvalidAuthorization(
                    "Bearer tokens are not accepted".to_string(),
                ));
            }

            return Ok(Resolution::Found(Credential::BearerToken(
                SecretString::from(token.to_string()),
            )));
        }

        let api_key = match api_key_header {
            Some(value) => Some(
                value
                    .to_str()
                    .map(str::to_string)
                    .map_err(|_| AuthError::InvalidAuthorization("Invalid API key".to_string()))?,
            ),
            None => self.api_key_from_query(uri)?,
        };

        if let Some(key) = api_key {
            if key.trim().is_empty() {
                return Err(AuthError::InvalidAuthorization("Invalid API key".to_string()));
            }
            if self.mode == CredentialMode::BearerOnly {
                return Err(AuthError::InvalidAuthorization(
                    "API keys are not accepted".to_string(),
                ));
            }
            return Ok(Resolution::Found(Credential::ApiKey(SecretString::from(key))));
        }

        if self.allow_no_authorization {
            return Ok(Resolution::Anonymous);
        }

        Err(AuthError::MissingAuthorization(
            "Missing Authorization header".to_string(),
        ))
    }

    /// First value of the API-key query parameter, URL-decoded.
    fn api_key_from_query(&self, uri: &Uri) -> Result<Option<String>, AuthError> {
        if uri.query().is_none() {
            return Ok(None);
        }

        let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(uri).map_err(|e| {
            tracing::debug!(target: "auth_gateway.auth.credentials", error = %e, "Unparsable query string");
            AuthError::InvalidRequest("Invalid query string".to_string())
        })?;

        Ok(pairs
            .into_iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(self.api_key_header.as_str()))
            .map(|(_, value)| value))
    }
}
