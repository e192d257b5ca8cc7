//! The authentication gate.
//!
//! [`AuthGate`] runs one request through an explicit state machine:
//!
//! ```text
//! ResolvingCredential ──bearer──────────────────────► VerifyingToken
//!        │                                                  │
//!        └──api key──► ExchangingApiKey ──token───────────►─┤
//!                             │                             ▼
//!                             └──cache hit──► CheckingAuthorization
//!                                                           │
//!                                                           ▼
//!                                                      Propagating ──► Completed
//! ```
//!
//! Any stage may move to `Failed`. The gate owns the token cache; it is only
//! written in `Propagating`, so only authorized tokens are cached.

use crate::auth::authorization::AuthorizationPolicy;
use crate::auth::cache::{bypasses_cache, TokenCache};
use crate::auth::claims::DecodedToken;
use crate::auth::credentials::{Credential, CredentialResolver, Resolution};
use crate::auth::exchange::{ApiKeyExchange, HttpApiKeyExchanger};
use crate::auth::propagation;
use crate::auth::verifier::TokenVerifier;
use crate::config::{Config, ConfigError};
use crate::errors::AuthError;
use crate::observability::metrics;
use axum::http::{header, HeaderMap, Uri};
use common::secret::{key_hint, ExposeSecret, SecretString};
use std::sync::Arc;
use tracing::instrument;

/// Log target for fail-open decisions.
const SECURITY_LOG_TARGET: &str = "auth_gateway.auth.security";

/// Why a request was let through without authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BypassReason {
    /// No credential, `allow_no_authorization` set.
    NoAuthorization,
    /// Malformed or unverifiable credential, `allow_invalid_authorization` set.
    InvalidAuthorization,
}

/// How the gate let a request through.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthOutcome {
    Authorized(Box<DecodedToken>),
    Bypassed(BypassReason),
}

/// Pipeline stage for one request.
#[derive(Debug)]
pub enum AuthStage {
    ResolvingCredential,
    ExchangingApiKey {
        api_key: SecretString,
    },
    VerifyingToken {
        token: SecretString,
        api_key: Option<SecretString>,
    },
    CheckingAuthorization {
        token: Box<DecodedToken>,
        api_key: Option<SecretString>,
    },
    Propagating {
        token: Box<DecodedToken>,
        api_key: Option<SecretString>,
    },
    Failed(AuthError),
    Completed(AuthOutcome),
}

impl AuthStage {
    pub fn name(&self) -> &'static str {
        match self {
            AuthStage::ResolvingCredential => "resolving_credential",
            AuthStage::ExchangingApiKey { .. } => "exchanging_api_key",
            AuthStage::VerifyingToken { .. } => "verifying_token",
            AuthStage::CheckingAuthorization { .. } => "checking_authorization",
            AuthStage::Propagating { .. } => "propagating",
            AuthStage::Failed(_) => "failed",
            AuthStage::Completed(_) => "completed",
        }
    }
}

/// The parts of a request the gate reads and rewrites.
pub struct GateRequest<'a> {
    pub headers: &'a mut HeaderMap,
    pub uri: &'a Uri,
    pub proxy: Option<&'a str>,
}

impl GateRequest<'_> {
    /// Any `cache-control` value may carry the bypass directive.
    fn cache_bypassed(&self) -> bool {
        self.headers
            .get_all(header::CACHE_CONTROL)
            .iter()
            .any(|v| bypasses_cache(v.to_str().ok()))
    }
}

/// Fail-open switches.
#[derive(Debug, Clone, Copy, Default)]
pub struct GatePolicy {
    pub allow_invalid_authorization: bool,
    pub api_key_cache_enabled: bool,
}

/// Request authentication and authorization gate.
#[derive(Clone)]
pub struct AuthGate {
    resolver: CredentialResolver,
    verifier: TokenVerifier,
    exchanger: Arc<dyn ApiKeyExchange>,
    authorization: AuthorizationPolicy,
    cache: TokenCache,
    policy: GatePolicy,
}

impl AuthGate {
    pub fn new(
        resolver: CredentialResolver,
        verifier: TokenVerifier,
        exchanger: Arc<dyn ApiKeyExchange>,
        authorization: AuthorizationPolicy,
        cache: TokenCache,
        policy: GatePolicy,
    ) -> Self {
        Self {
            resolver,
            verifier,
            exchanger,
            authorization,
            cache,
            policy,
        }
    }

    /// Build a gate with the HTTP exchanger and a fresh cache.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the public key or HTTP client is unusable.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self::new(
            CredentialResolver::from_config(config),
            TokenVerifier::from_config(config)?,
            Arc::new(HttpApiKeyExchanger::from_config(config)?),
            AuthorizationPolicy::new(config.product_to_proxy.clone()),
            TokenCache::new(),
            GatePolicy {
                allow_invalid_authorization: config.allow_invalid_authorization,
                api_key_cache_enabled: config.api_key_cache_enabled,
            },
        ))
    }

    /// The gate's token cache, for administrative access.
    pub fn cache(&self) -> &TokenCache {
        &self.cache
    }

    /// Run the request through the pipeline.
    ///
    /// On success the credential headers are gone from `req.headers` and, for
    /// an authorized request, the claims header is set.
    #[instrument(skip_all, name = "gw.auth.gate", fields(proxy = req.proxy.unwrap_or("-")))]
    pub async fn authenticate(&self, mut req: GateRequest<'_>) -> Result<AuthOutcome, AuthError> {
        let mut stage = AuthStage::ResolvingCredential;
        loop {
            stage = match stage {
                AuthStage::Completed(outcome) => {
                    metrics::record_auth_outcome(match &outcome {
                        AuthOutcome::Authorized(_) => "authorized",
                        AuthOutcome::Bypassed(_) => "bypassed",
                    });
                    return Ok(outcome);
                }
                AuthStage::Failed(err) => {
                    metrics::record_auth_outcome("rejected");
                    return Err(err);
                }
                current => self.advance(current, &mut req).await,
            };
        }
    }

    /// Perform one transition.
    pub async fn advance(&self, stage: AuthStage, req: &mut GateRequest<'_>) -> AuthStage {
        tracing::trace!(target: "auth_gateway.auth", stage = stage.name(), "Advancing");

        match stage {
            AuthStage::ResolvingCredential => self.resolve_credential(req),
            AuthStage::ExchangingApiKey { api_key } => self.exchange_api_key(api_key, req).await,
            AuthStage::VerifyingToken { token, api_key } => {
                match self.verifier.verify(&token).await {
                    Ok(decoded) => AuthStage::CheckingAuthorization {
                        token: Box::new(decoded),
                        api_key,
                    },
                    Err(err) => self.fail_open_or(err, "token verification failed"),
                }
            }
            AuthStage::CheckingAuthorization { token, api_key } => {
                match self.authorization.check(&token, req.proxy) {
                    Ok(()) => AuthStage::Propagating { token, api_key },
                    Err(err) => AuthStage::Failed(err),
                }
            }
            AuthStage::Propagating { token, api_key } => self.propagate(token, api_key, req).await,
            terminal @ (AuthStage::Failed(_) | AuthStage::Completed(_)) => terminal,
        }
    }

    fn resolve_credential(&self, req: &mut GateRequest<'_>) -> AuthStage {
        match self.resolver.resolve(req.headers, req.uri) {
            Ok(Resolution::Found(credential)) => {
                tracing::debug!(
                    target: "auth_gateway.auth",
                    credential = credential.kind(),
                    "Credential resolved"
                );
                match credential {
                    Credential::BearerToken(token) => AuthStage::VerifyingToken {
                        token,
                        api_key: None,
                    },
                    Credential::ApiKey(api_key) => AuthStage::ExchangingApiKey { api_key },
                }
            }
            Ok(Resolution::Anonymous) => {
                tracing::info!(
                    target: SECURITY_LOG_TARGET,
                    security = true,
                    reason = "allow_no_authorization",
                    "Request without credential let through"
                );
                AuthStage::Completed(AuthOutcome::Bypassed(BypassReason::NoAuthorization))
            }
            Err(err @ AuthError::InvalidRequest(_)) => {
                self.fail_open_or(err, "malformed authorization header")
            }
            Err(err) => AuthStage::Failed(err),
        }
    }

    async fn exchange_api_key(&self, api_key: SecretString, req: &GateRequest<'_>) -> AuthStage {
        if self.cache_usable(req) {
            if let Some(cached) = self.cache.lookup(api_key.expose_secret()).await {
                tracing::debug!(
                    target: "auth_gateway.auth",
                    key = %key_hint(&api_key),
                    "Using cached token for API key"
                );
                return AuthStage::CheckingAuthorization {
                    token: Box::new(cached),
                    api_key: Some(api_key),
                };
            }
        } else {
            metrics::record_token_cache_lookup("bypassed");
        }

        match self.exchanger.exchange(&api_key).await {
            Ok(token) => AuthStage::VerifyingToken {
                token,
                api_key: Some(api_key),
            },
            Err(err) => AuthStage::Failed(err),
        }
    }

    async fn propagate(
        &self,
        token: Box<DecodedToken>,
        api_key: Option<SecretString>,
        req: &mut GateRequest<'_>,
    ) -> AuthStage {
        if let Err(err) = propagation::propagate(req.headers, &token) {
            return AuthStage::Failed(err);
        }

        if let Some(api_key) = api_key {
            if self.cache_usable(req) {
                self.cache
                    .store(api_key.expose_secret(), (*token).clone(), None)
                    .await;
            }
        }

        AuthStage::Completed(AuthOutcome::Authorized(token))
    }

    fn cache_usable(&self, req: &GateRequest<'_>) -> bool {
        self.policy.api_key_cache_enabled && !req.cache_bypassed()
    }

    fn fail_open_or(&self, err: AuthError, what: &'static str) -> AuthStage {
        if self.policy.allow_invalid_authorization {
            tracing::warn!(
                target: SECURITY_LOG_TARGET,
                security = true,
                reason = "allow_invalid_authorization",
                code = err.code(),
                "Request let through despite {}",
                what
            );
            AuthStage::Completed(AuthOutcome::Bypassed(BypassReason::InvalidAuthorization))
        } else {
            AuthStage::Failed(err)
        }
    }
}
