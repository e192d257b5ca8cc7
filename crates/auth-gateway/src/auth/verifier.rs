//! Token verification.
//!
//! Verifies bearer tokens (and tokens returned by the API-key exchange)
//! against the configured public key.
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing
//! - Only the configured algorithm is accepted; the header `alg` is checked
//!   against it before any key work
//! - Expiration is always enforced; `iat` is checked against clock skew
//! - Client-facing messages are generic

use crate::auth::claims::DecodedToken;
use crate::config::{Config, ConfigError};
use crate::errors::AuthError;
use common::jwt::{extract_alg, validate_iat, DEFAULT_CLOCK_SKEW};
use common::secret::{ExposeSecret, SecretString};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

const INVALID_TOKEN_MESSAGE: &str = "The access token is invalid";
const EXPIRED_TOKEN_MESSAGE: &str = "The access token has expired";

/// Inputs for building a [`TokenVerifier`].
#[derive(Debug, Clone)]
pub struct VerifierSettings {
    pub public_key_pem: Option<String>,
    pub algorithm: Algorithm,
    pub leeway_seconds: u64,
    pub clock_skew: Duration,
    pub audience: Option<String>,
    pub issuer: Option<String>,
}

impl Default for VerifierSettings {
    fn default() -> Self {
        Self {
            public_key_pem: None,
            algorithm: Algorithm::RS256,
            leeway_seconds: 0,
            clock_skew: DEFAULT_CLOCK_SKEW,
            audience: None,
            issuer: None,
        }
    }
}

struct VerificationKey {
    decoding_key: DecodingKey,
    validation: Validation,
}

/// Verifies token signatures and standard claims.
///
/// Cheap to clone; the decoding key is shared.
#[derive(Clone)]
pub struct TokenVerifier {
    key: Option<Arc<VerificationKey>>,
    algorithm: Algorithm,
    clock_skew: Duration,
}

impl TokenVerifier {
    /// Build a verifier.
    ///
    /// Without a public key every verification fails with `invalid_token`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidPublicKey` if the PEM does not hold a key
    /// usable with the configured algorithm.
    pub fn new(settings: VerifierSettings) -> Result<Self, ConfigError> {
        let key = match settings.public_key_pem.as_deref() {
            Some(pem) => {
                let decoding_key = decoding_key_for(settings.algorithm, pem.as_bytes())
                    .map_err(|e| {
                        ConfigError::InvalidPublicKey(format!(
                            "not a {:?} public key: {}",
                            settings.algorithm, e
                        ))
                    })?;
                Some(Arc::new(VerificationKey {
                    decoding_key,
                    validation: build_validation(&settings),
                }))
            }
            None => {
                tracing::warn!(
                    target: "auth_gateway.auth.verifier",
                    "No public key configured; every token will be rejected"
                );
                None
            }
        };

        Ok(Self {
            key,
            algorithm: settings.algorithm,
            clock_skew: settings.clock_skew,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Self::new(VerifierSettings {
            public_key_pem: config.public_key_pem().map(str::to_string),
            algorithm: config.jwt_algorithm,
            leeway_seconds: config.jwt_leeway_seconds,
            clock_skew: Duration::from_secs(config.jwt_clock_skew_seconds.unsigned_abs()),
            audience: config.jwt_audience.clone(),
            issuer: config.jwt_issuer.clone(),
        })
    }

    /// Verify a token and return its claims.
    ///
    /// Signature checking runs on the blocking pool.
    ///
    /// # Errors
    ///
    /// - `AccessDenied` - the token has expired
    /// - `InvalidToken` - every other failure
    #[instrument(skip_all, name = "gw.auth.verify")]
    pub async fn verify(&self, token: &SecretString) -> Result<DecodedToken, AuthError> {
        let raw = token.expose_secret();

        // Includes the size check
        let alg = extract_alg(raw).map_err(|e| {
            tracing::debug!(target: "auth_gateway.auth.verifier", error = ?e, "Token header rejected");
            invalid_token()
        })?;

        if Algorithm::from_str(&alg).ok() != Some(self.algorithm) {
            tracing::warn!(
                target: "auth_gateway.auth.verifier",
                presented = %alg,
                expected = ?self.algorithm,
                "Token signed with unexpected algorithm"
            );
            return Err(invalid_token());
        }

        let Some(key) = self.key.clone() else {
            tracing::error!(
                target: "auth_gateway.auth.verifier",
                "Cannot verify token: no public key configured"
            );
            return Err(invalid_token());
        };

        let raw = raw.to_string();
        let token_data = tokio::task::spawn_blocking(move || {
            decode::<DecodedToken>(&raw, &key.decoding_key, &key.validation)
        })
        .await
        .map_err(|e| AuthError::Internal(format!("verification task failed: {}", e)))?
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => {
                tracing::debug!(target: "auth_gateway.auth.verifier", "Token expired");
                AuthError::AccessDenied(EXPIRED_TOKEN_MESSAGE.to_string())
            }
            _ => {
                tracing::debug!(target: "auth_gateway.auth.verifier", error = %e, "Token verification failed");
                invalid_token()
            }
        })?;

        let claims = token_data.claims;

        if let Some(iat) = claims.iat {
            validate_iat(iat, self.clock_skew).map_err(|e| {
                tracing::debug!(target: "auth_gateway.auth.verifier", error = ?e, "Token iat validation failed");
                invalid_token()
            })?;
        }

        tracing::debug!(target: "auth_gateway.auth.verifier", "Token verified");
        Ok(claims)
    }
}

fn invalid_token() -> AuthError {
    AuthError::InvalidToken(INVALID_TOKEN_MESSAGE.to_string())
}

fn decoding_key_for(
    algorithm: Algorithm,
    pem: &[u8],
) -> Result<DecodingKey, jsonwebtoken::errors::Error> {
    match algorithm {
        Algorithm::RS256
        | Algorithm::RS384
        | Algorithm::RS512
        | Algorithm::PS256
        | Algorithm::PS384
        | Algorithm::PS512 => DecodingKey::from_rsa_pem(pem),
        Algorithm::ES256 | Algorithm::ES384 => DecodingKey::from_ec_pem(pem),
        Algorithm::EdDSA => DecodingKey::from_ed_pem(pem),
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => {
            Err(ErrorKind::InvalidAlgorithm.into())
        }
    }
}

fn build_validation(settings: &VerifierSettings) -> Validation {
    let mut validation = Validation::new(settings.algorithm);
    validation.validate_exp = true;
    validation.validate_nbf = true;
    validation.leeway = settings.leeway_seconds;

    match &settings.audience {
        Some(aud) => validation.set_audience(&[aud]),
        None => validation.validate_aud = false,
    }
    if let Some(iss) = &settings.issuer {
        validation.set_issuer(&[iss]);
    }

    validation
}
