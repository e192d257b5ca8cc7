//! Auth gateway configuration.
//!
//! Configuration is loaded from environment variables. The public key is
//! kept in a `SecretString` and summarized in Debug output.

use axum::http::HeaderName;
use common::jwt::{normalize_pem, DEFAULT_CLOCK_SKEW, MAX_CLOCK_SKEW};
use common::secret::{ExposeSecret, SecretString};
use jsonwebtoken::Algorithm;
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Default public listener address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Default admin listener address (admin endpoints and `/metrics`).
pub const DEFAULT_ADMIN_BIND_ADDRESS: &str = "127.0.0.1:9090";

/// Default name of the header carrying the bearer token.
pub const DEFAULT_AUTHORIZATION_HEADER: &str = "authorization";

/// Default name of the API-key header and query parameter.
pub const DEFAULT_API_KEY_HEADER: &str = "x-api-key";

/// Default header carrying the API key on the verification call.
pub const DEFAULT_API_KEY_EXCHANGE_HEADER: &str = "x-dna-api-key";

/// Default timeout for the verification call.
pub const DEFAULT_API_KEY_EXCHANGE_TIMEOUT_SECONDS: u64 = 10;

/// Upper bound for `JWT_LEEWAY_SECONDS`.
pub const MAX_JWT_LEEWAY_SECONDS: u64 = 600;

/// Auth gateway configuration.
#[derive(Clone)]
pub struct Config {
    /// Public listener address (default: "0.0.0.0:8080").
    pub bind_address: String,

    /// Admin listener address (default: "127.0.0.1:9090").
    pub admin_bind_address: String,

    /// Header carrying `Bearer <token>`.
    pub authorization_header: HeaderName,

    /// Header carrying the API key. The same name is used as query parameter.
    pub api_key_header: HeaderName,

    /// Let requests without any credential through unauthenticated.
    pub allow_no_authorization: bool,

    /// Let requests with a malformed or unverifiable credential through
    /// unauthenticated.
    pub allow_invalid_authorization: bool,

    /// Accept bearer tokens only.
    pub allow_oauth_only: bool,

    /// Accept API keys only.
    pub allow_api_key_only: bool,

    /// Endpoint exchanging an API key for a token. `None` disables the
    /// API-key flow.
    pub verify_api_key_url: Option<String>,

    /// Header carrying the API key on the verification call.
    pub api_key_exchange_header: HeaderName,

    /// Transport timeout for the verification call, in seconds.
    pub api_key_exchange_timeout_seconds: u64,

    /// Global switch for the API-key token cache.
    pub api_key_cache_enabled: bool,

    /// PEM-encoded public key used to verify token signatures.
    pub public_key: Option<SecretString>,

    /// Signature algorithm every token must use.
    pub jwt_algorithm: Algorithm,

    /// Leeway applied to `exp` (and `nbf`), in seconds.
    pub jwt_leeway_seconds: u64,

    /// Maximum accepted distance of `iat` into the future, in seconds.
    pub jwt_clock_skew_seconds: i64,

    /// Required `aud` value, if any.
    pub jwt_audience: Option<String>,

    /// Required `iss` value, if any.
    pub jwt_issuer: Option<String>,

    /// Product name to the proxies it grants access to.
    pub product_to_proxy: HashMap<String, Vec<String>>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bind_address", &self.bind_address)
            .field("admin_bind_address", &self.admin_bind_address)
            .field("authorization_header", &self.authorization_header)
            .field("api_key_header", &self.api_key_header)
            .field("allow_no_authorization", &self.allow_no_authorization)
            .field(
                "allow_invalid_authorization",
                &self.allow_invalid_authorization,
            )
            .field("allow_oauth_only", &self.allow_oauth_only)
            .field("allow_api_key_only", &self.allow_api_key_only)
            .field("verify_api_key_url", &self.verify_api_key_url)
            .field("api_key_exchange_header", &self.api_key_exchange_header)
            .field(
                "api_key_exchange_timeout_seconds",
                &self.api_key_exchange_timeout_seconds,
            )
            .field("api_key_cache_enabled", &self.api_key_cache_enabled)
            .field(
                "public_key",
                &self.public_key.as_ref().map(|_| "[PEM]"),
            )
            .field("jwt_algorithm", &self.jwt_algorithm)
            .field("jwt_leeway_seconds", &self.jwt_leeway_seconds)
            .field("jwt_clock_skew_seconds", &self.jwt_clock_skew_seconds)
            .field("jwt_audience", &self.jwt_audience)
            .field("jwt_issuer", &self.jwt_issuer)
            .field("product_to_proxy", &self.product_to_proxy.len())
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid boolean for {0}: expected true/false/1/0")]
    InvalidBool(String),

    #[error("Invalid header name for {0}: {1}")]
    InvalidHeaderName(String, String),

    #[error("Invalid verification URL: {0}")]
    InvalidVerifyUrl(String),

    #[error("Invalid API-key exchange timeout: {0}")]
    InvalidExchangeTimeout(String),

    #[error("Could not read public key: {0}")]
    PublicKeyFile(String),

    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("Invalid JWT algorithm: {0}")]
    InvalidJwtAlgorithm(String),

    #[error("Invalid JWT leeway configuration: {0}")]
    InvalidJwtLeeway(String),

    #[error("Invalid JWT clock skew configuration: {0}")]
    InvalidJwtClockSkew(String),

    #[error("Invalid PRODUCT_TO_PROXY: {0}")]
    InvalidProductToProxy(String),

    #[error("ALLOW_OAUTH_ONLY and ALLOW_API_KEY_ONLY cannot both be set")]
    ConflictingCredentialModes,

    #[error("Could not build HTTP client: {0}")]
    HttpClient(String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let admin_bind_address = vars
            .get("ADMIN_BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_ADMIN_BIND_ADDRESS.to_string());

        let authorization_header =
            parse_header_name(vars, "AUTHORIZATION_HEADER", DEFAULT_AUTHORIZATION_HEADER)?;
        let api_key_header = parse_header_name(vars, "API_KEY_HEADER", DEFAULT_API_KEY_HEADER)?;
        let api_key_exchange_header = parse_header_name(
            vars,
            "API_KEY_EXCHANGE_HEADER",
            DEFAULT_API_KEY_EXCHANGE_HEADER,
        )?;

        let allow_no_authorization = parse_bool(vars, "ALLOW_NO_AUTHORIZATION", false)?;
        let allow_invalid_authorization = parse_bool(vars, "ALLOW_INVALID_AUTHORIZATION", false)?;
        let allow_oauth_only = parse_bool(vars, "ALLOW_OAUTH_ONLY", false)?;
        let allow_api_key_only = parse_bool(vars, "ALLOW_API_KEY_ONLY", false)?;
        if allow_oauth_only && allow_api_key_only {
            return Err(ConfigError::ConflictingCredentialModes);
        }

        let api_key_cache_enabled = parse_bool(vars, "API_KEY_CACHE", true)?;

        let verify_api_key_url = match vars.get("VERIFY_API_KEY_URL") {
            Some(value) if !value.trim().is_empty() => {
                let url = reqwest::Url::parse(value.trim()).map_err(|e| {
                    ConfigError::InvalidVerifyUrl(format!("'{}': {}", value, e))
                })?;
                if !matches!(url.scheme(), "http" | "https") {
                    return Err(ConfigError::InvalidVerifyUrl(format!(
                        "scheme must be http or https, got '{}'",
                        url.scheme()
                    )));
                }
                Some(url.to_string())
            }
            _ => None,
        };

        let api_key_exchange_timeout_seconds =
            if let Some(value_str) = vars.get("API_KEY_EXCHANGE_TIMEOUT_SECONDS") {
                let value: u64 = value_str.parse().map_err(|e| {
                    ConfigError::InvalidExchangeTimeout(format!(
                        "API_KEY_EXCHANGE_TIMEOUT_SECONDS must be a valid positive integer, got '{}': {}",
                        value_str, e
                    ))
                })?;

                if value == 0 {
                    return Err(ConfigError::InvalidExchangeTimeout(
                        "API_KEY_EXCHANGE_TIMEOUT_SECONDS must be greater than 0".to_string(),
                    ));
                }

                value
            } else {
                DEFAULT_API_KEY_EXCHANGE_TIMEOUT_SECONDS
            };

        let public_key = load_public_key(vars)?;

        let jwt_algorithm = match vars.get("JWT_ALGORITHM") {
            Some(value) => parse_algorithm(value)?,
            None => Algorithm::RS256,
        };

        let jwt_leeway_seconds = if let Some(value_str) = vars.get("JWT_LEEWAY_SECONDS") {
            let value: u64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidJwtLeeway(format!(
                    "JWT_LEEWAY_SECONDS must be a valid non-negative integer, got '{}': {}",
                    value_str, e
                ))
            })?;

            if value > MAX_JWT_LEEWAY_SECONDS {
                return Err(ConfigError::InvalidJwtLeeway(format!(
                    "JWT_LEEWAY_SECONDS must not exceed {} seconds, got {}",
                    MAX_JWT_LEEWAY_SECONDS, value
                )));
            }

            value
        } else {
            0
        };

        // Parse JWT clock skew tolerance with validation
        let jwt_clock_skew_seconds = if let Some(value_str) = vars.get("JWT_CLOCK_SKEW_SECONDS") {
            let value: i64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidJwtClockSkew(format!(
                    "JWT_CLOCK_SKEW_SECONDS must be a valid integer, got '{}': {}",
                    value_str, e
                ))
            })?;

            if value <= 0 {
                return Err(ConfigError::InvalidJwtClockSkew(format!(
                    "JWT_CLOCK_SKEW_SECONDS must be positive, got {}",
                    value
                )));
            }

            if value > MAX_CLOCK_SKEW.as_secs() as i64 {
                return Err(ConfigError::InvalidJwtClockSkew(format!(
                    "JWT_CLOCK_SKEW_SECONDS must not exceed {} seconds, got {}",
                    MAX_CLOCK_SKEW.as_secs(),
                    value
                )));
            }

            value
        } else {
            DEFAULT_CLOCK_SKEW.as_secs() as i64
        };

        let jwt_audience = non_empty(vars, "JWT_AUDIENCE");
        let jwt_issuer = non_empty(vars, "JWT_ISSUER");

        let product_to_proxy = match vars.get("PRODUCT_TO_PROXY") {
            Some(raw) if !raw.trim().is_empty() => serde_json::from_str(raw)
                .map_err(|e| ConfigError::InvalidProductToProxy(e.to_string()))?,
            _ => HashMap::new(),
        };

        Ok(Config {
            bind_address,
            admin_bind_address,
            authorization_header,
            api_key_header,
            allow_no_authorization,
            allow_invalid_authorization,
            allow_oauth_only,
            allow_api_key_only,
            verify_api_key_url,
            api_key_exchange_header,
            api_key_exchange_timeout_seconds,
            api_key_cache_enabled,
            public_key,
            jwt_algorithm,
            jwt_leeway_seconds,
            jwt_clock_skew_seconds,
            jwt_audience,
            jwt_issuer,
            product_to_proxy,
        })
    }
}

fn parse_bool(
    vars: &HashMap<String, String>,
    name: &str,
    default: bool,
) -> Result<bool, ConfigError> {
    match vars.get(name).map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(default),
        Some(v) if v.is_empty() => Ok(default),
        Some(v) if v == "true" || v == "1" => Ok(true),
        Some(v) if v == "false" || v == "0" => Ok(false),
        Some(_) => Err(ConfigError::InvalidBool(name.to_string())),
    }
}

fn parse_header_name(
    vars: &HashMap<String, String>,
    name: &str,
    default: &str,
) -> Result<HeaderName, ConfigError> {
    let raw = vars.get(name).map(|v| v.trim()).unwrap_or(default);
    HeaderName::from_bytes(raw.as_bytes())
        .map_err(|e| ConfigError::InvalidHeaderName(name.to_string(), e.to_string()))
}

fn non_empty(vars: &HashMap<String, String>, name: &str) -> Option<String> {
    vars.get(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse an asymmetric signature algorithm name.
///
/// HMAC algorithms are refused: the gate only ever holds a public key.
fn parse_algorithm(value: &str) -> Result<Algorithm, ConfigError> {
    let algorithm = Algorithm::from_str(value.trim())
        .map_err(|_| ConfigError::InvalidJwtAlgorithm(format!("unknown algorithm '{}'", value)))?;

    match algorithm {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Err(
            ConfigError::InvalidJwtAlgorithm(format!("'{}' is not an asymmetric algorithm", value)),
        ),
        other => Ok(other),
    }
}

/// `PUBLIC_KEY` wins over `PUBLIC_KEY_FILE`. Literal `\n` sequences from
/// single-line environment values are turned back into line breaks.
fn load_public_key(vars: &HashMap<String, String>) -> Result<Option<SecretString>, ConfigError> {
    let raw = if let Some(inline) = vars.get("PUBLIC_KEY").filter(|v| !v.trim().is_empty()) {
        inline.clone()
    } else if let Some(path) = vars.get("PUBLIC_KEY_FILE").filter(|v| !v.trim().is_empty()) {
        std::fs::read_to_string(path.trim())
            .map_err(|e| ConfigError::PublicKeyFile(format!("{}: {}", path, e)))?
    } else {
        return Ok(None);
    };

    let pem = normalize_pem(&raw);
    if !pem.starts_with("-----BEGIN ") {
        return Err(ConfigError::InvalidPublicKey(
            "expected a PEM block starting with -----BEGIN".to_string(),
        ));
    }

    Ok(Some(SecretString::from(pem)))
}

impl Config {
    /// Public key PEM, if configured.
    pub fn public_key_pem(&self) -> Option<&str> {
        self.public_key.as_ref().map(|k| k.expose_secret())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const TEST_PEM: &str = "-----BEGIN PUBLIC KEY-----\nMCowBQYDK2VwAyEA\n-----END PUBLIC KEY-----\n";

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_from_vars_success_with_defaults() {
        let config = Config::from_vars(&HashMap::new()).expect("Config should load successfully");

        assert_eq!(config.bind_address, DEFAULT_BIND_ADDRESS);
        assert_eq!(config.admin_bind_address, DEFAULT_ADMIN_BIND_ADDRESS);
        assert_eq!(config.authorization_header.as_str(), "authorization");
        assert_eq!(config.api_key_header.as_str(), "x-api-key");
        assert_eq!(config.api_key_exchange_header.as_str(), "x-dna-api-key");
        assert!(!config.allow_no_authorization);
        assert!(!config.allow_invalid_authorization);
        assert!(!config.allow_oauth_only);
        assert!(!config.allow_api_key_only);
        assert!(config.verify_api_key_url.is_none());
        assert_eq!(
            config.api_key_exchange_timeout_seconds,
            DEFAULT_API_KEY_EXCHANGE_TIMEOUT_SECONDS
        );
        assert!(config.api_key_cache_enabled);
        assert!(config.public_key.is_none());
        assert_eq!(config.jwt_algorithm, Algorithm::RS256);
        assert_eq!(config.jwt_leeway_seconds, 0);
        assert_eq!(
            config.jwt_clock_skew_seconds,
            DEFAULT_CLOCK_SKEW.as_secs() as i64
        );
        assert!(config.jwt_audience.is_none());
        assert!(config.jwt_issuer.is_none());
        assert!(config.product_to_proxy.is_empty());
    }

    #[test]
    fn test_from_vars_success_with_custom_values() {
        let config = Config::from_vars(&vars(&[
            ("BIND_ADDRESS", "127.0.0.1:8000"),
            ("ADMIN_BIND_ADDRESS", "127.0.0.1:8001"),
            ("AUTHORIZATION_HEADER", "X-Edge-Authorization"),
            ("API_KEY_HEADER", "apikey"),
            ("ALLOW_NO_AUTHORIZATION", "true"),
            ("ALLOW_INVALID_AUTHORIZATION", "1"),
            ("VERIFY_API_KEY_URL", "https://edge.example.com/verifyApiKey"),
            ("API_KEY_EXCHANGE_HEADER", "x-key"),
            ("API_KEY_EXCHANGE_TIMEOUT_SECONDS", "3"),
            ("API_KEY_CACHE", "false"),
            ("PUBLIC_KEY", TEST_PEM),
            ("JWT_ALGORITHM", "EdDSA"),
            ("JWT_LEEWAY_SECONDS", "5"),
            ("JWT_CLOCK_SKEW_SECONDS", "120"),
            ("JWT_AUDIENCE", "edge"),
            ("JWT_ISSUER", "https://issuer.example.com"),
            ("PRODUCT_TO_PROXY", r#"{"gold": ["orders", "users"]}"#),
        ]))
        .expect("Config should load successfully");

        assert_eq!(config.bind_address, "127.0.0.1:8000");
        assert_eq!(config.admin_bind_address, "127.0.0.1:8001");
        // Header names are normalized to lowercase
        assert_eq!(config.authorization_header.as_str(), "x-edge-authorization");
        assert_eq!(config.api_key_header.as_str(), "apikey");
        assert!(config.allow_no_authorization);
        assert!(config.allow_invalid_authorization);
        assert_eq!(
            config.verify_api_key_url.as_deref(),
            Some("https://edge.example.com/verifyApiKey")
        );
        assert_eq!(config.api_key_exchange_header.as_str(), "x-key");
        assert_eq!(config.api_key_exchange_timeout_seconds, 3);
        assert!(!config.api_key_cache_enabled);
        assert_eq!(config.public_key_pem(), Some(TEST_PEM));
        assert_eq!(config.jwt_algorithm, Algorithm::EdDSA);
        assert_eq!(config.jwt_leeway_seconds, 5);
        assert_eq!(config.jwt_clock_skew_seconds, 120);
        assert_eq!(config.jwt_audience.as_deref(), Some("edge"));
        assert_eq!(
            config.jwt_issuer.as_deref(),
            Some("https://issuer.example.com")
        );
        assert_eq!(
            config.product_to_proxy.get("gold"),
            Some(&vec!["orders".to_string(), "users".to_string()])
        );
    }

    #[test]
    fn test_debug_does_not_print_public_key() {
        let config = Config::from_vars(&vars(&[("PUBLIC_KEY", TEST_PEM)])).unwrap();
        let debug = format!("{:?}", config);

        assert!(debug.contains("[PEM]"));
        assert!(!debug.contains("MCowBQYDK2VwAyEA"));
    }

    #[test]
    fn test_public_key_with_escaped_newlines() {
        let single_line =
            "-----BEGIN PUBLIC KEY-----\\nMCowBQYDK2VwAyEA\\n-----END PUBLIC KEY-----";
        let config = Config::from_vars(&vars(&[("PUBLIC_KEY", single_line)])).unwrap();

        assert_eq!(config.public_key_pem(), Some(TEST_PEM));
    }

    #[test]
    fn test_public_key_rejects_non_pem() {
        let result = Config::from_vars(&vars(&[("PUBLIC_KEY", "not a key")]));
        assert!(matches!(result, Err(ConfigError::InvalidPublicKey(_))));
    }

    #[test]
    fn test_public_key_file_missing() {
        let result = Config::from_vars(&vars(&[(
            "PUBLIC_KEY_FILE",
            "/nonexistent/auth-gateway/key.pem",
        )]));
        assert!(
            matches!(result, Err(ConfigError::PublicKeyFile(msg)) if msg.contains("/nonexistent/auth-gateway/key.pem"))
        );
    }

    #[test]
    fn test_public_key_file_is_read() {
        let path = std::env::temp_dir().join(format!("auth-gateway-{}.pem", uuid::Uuid::new_v4()));
        std::fs::write(&path, TEST_PEM).unwrap();

        let config = Config::from_vars(&vars(&[(
            "PUBLIC_KEY_FILE",
            path.to_str().unwrap(),
        )]))
        .unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.public_key_pem(), Some(TEST_PEM));
    }

    #[test]
    fn test_invalid_bool_is_rejected() {
        let result = Config::from_vars(&vars(&[("ALLOW_NO_AUTHORIZATION", "yes please")]));
        assert!(matches!(result, Err(ConfigError::InvalidBool(v)) if v == "ALLOW_NO_AUTHORIZATION"));
    }

    #[test]
    fn test_conflicting_credential_modes() {
        let result = Config::from_vars(&vars(&[
            ("ALLOW_OAUTH_ONLY", "true"),
            ("ALLOW_API_KEY_ONLY", "true"),
        ]));
        assert!(matches!(result, Err(ConfigError::ConflictingCredentialModes)));
    }

    #[test]
    fn test_invalid_header_name() {
        let result = Config::from_vars(&vars(&[("API_KEY_HEADER", "x api key")]));
        assert!(
            matches!(result, Err(ConfigError::InvalidHeaderName(v, _)) if v == "API_KEY_HEADER")
        );
    }

    #[test]
    fn test_verify_url_must_be_http() {
        let result = Config::from_vars(&vars(&[("VERIFY_API_KEY_URL", "ftp://edge.example.com")]));
        assert!(
            matches!(result, Err(ConfigError::InvalidVerifyUrl(msg)) if msg.contains("scheme"))
        );

        let result = Config::from_vars(&vars(&[("VERIFY_API_KEY_URL", "not a url")]));
        assert!(matches!(result, Err(ConfigError::InvalidVerifyUrl(_))));
    }

    #[test]
    fn test_exchange_timeout_rejects_zero() {
        let result = Config::from_vars(&vars(&[("API_KEY_EXCHANGE_TIMEOUT_SECONDS", "0")]));
        assert!(
            matches!(result, Err(ConfigError::InvalidExchangeTimeout(msg)) if msg.contains("must be greater than 0"))
        );
    }

    #[test]
    fn test_hmac_algorithm_is_rejected() {
        let result = Config::from_vars(&vars(&[("JWT_ALGORITHM", "HS256")]));
        assert!(
            matches!(result, Err(ConfigError::InvalidJwtAlgorithm(msg)) if msg.contains("asymmetric"))
        );
    }

    #[test]
    fn test_unknown_algorithm_is_rejected() {
        let result = Config::from_vars(&vars(&[("JWT_ALGORITHM", "none")]));
        assert!(matches!(result, Err(ConfigError::InvalidJwtAlgorithm(_))));
    }

    #[test]
    fn test_jwt_leeway_rejects_too_large() {
        let result = Config::from_vars(&vars(&[("JWT_LEEWAY_SECONDS", "601")]));
        assert!(
            matches!(result, Err(ConfigError::InvalidJwtLeeway(msg)) if msg.contains("must not exceed 600"))
        );
    }

    #[test]
    fn test_jwt_clock_skew_rejects_zero() {
        let result = Config::from_vars(&vars(&[("JWT_CLOCK_SKEW_SECONDS", "0")]));
        assert!(
            matches!(result, Err(ConfigError::InvalidJwtClockSkew(msg)) if msg.contains("must be positive"))
        );
    }

    #[test]
    fn test_jwt_clock_skew_rejects_too_large() {
        let result = Config::from_vars(&vars(&[("JWT_CLOCK_SKEW_SECONDS", "601")]));
        assert!(
            matches!(result, Err(ConfigError::InvalidJwtClockSkew(msg)) if msg.contains("must not exceed 600"))
        );
    }

    #[test]
    fn test_product_to_proxy_rejects_bad_json() {
        let result = Config::from_vars(&vars(&[("PRODUCT_TO_PROXY", r#"{"gold": "orders"}"#)]));
        assert!(matches!(result, Err(ConfigError::InvalidProductToProxy(_))));
    }
}
