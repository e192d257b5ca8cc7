//! Secret types for protecting credentials from accidental logging.
//!
//! Re-exports [`secrecy`] types. Every raw credential that crosses the gate
//! (bearer tokens, API keys, the configured public key) is held in a
//! `SecretString`, so deriving `Debug` on a struct that carries one is safe
//! and tracing fields recorded with `?` never leak the value.
//!
//! # Example
//!
//! ```rust
//! use common::secret::{ExposeSecret, SecretString};
//!
//! #[derive(Debug)]
//! struct ExchangeRequest {
//!     url: String,
//!     api_key: SecretString,
//! }
//!
//! let req = ExchangeRequest {
//!     url: "https://edge.example.com/verifyApiKey".to_string(),
//!     api_key: SecretString::from("k-123"),
//! };
//!
//! assert!(!format!("{req:?}").contains("k-123"));
//! assert_eq!(req.api_key.expose_secret(), "k-123");
//! ```
//!
//! When a log line needs to correlate requests made with the same key, use
//! [`key_hint`] instead of the key itself.

pub use secrecy::{ExposeSecret, SecretString};

/// Number of leading characters of a credential exposed by [`key_hint`].
const HINT_PREFIX_CHARS: usize = 4;

/// Short, non-reversible hint of a credential for log correlation.
///
/// Shows at most the first four characters followed by an ellipsis. Values
/// of eight characters or fewer are fully masked.
#[must_use]
pub fn key_hint(secret: &SecretString) -> String {
    let value = secret.expose_secret();
    if value.chars().count() <= HINT_PREFIX_CHARS * 2 {
        return "****".to_string();
    }
    let prefix: String = value.chars().take(HINT_PREFIX_CHARS).collect();
    format!("{prefix}…")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn test_debug_is_redacted() {
        let secret = SecretString::from("api-key-hunter2");
        let debug_str = format!("{secret:?}");

        assert!(debug_str.contains("REDACTED"));
        assert!(!debug_str.contains("hunter2"));
    }

    #[test]
    fn test_deserialize_keeps_value_hidden() {
        #[allow(dead_code)]
        #[derive(Debug, Deserialize)]
        struct KeyConfig {
            name: String,
            public_key: SecretString,
        }

        let json = r#"{"name": "edge", "public_key": "-----BEGIN PUBLIC KEY-----"}"#;
        let config: KeyConfig = serde_json::from_str(json).expect("deserialize");

        assert_eq!(config.public_key.expose_secret(), "-----BEGIN PUBLIC KEY-----");
        let debug = format!("{config:?}");
        assert!(debug.contains("edge"));
        assert!(!debug.contains("BEGIN PUBLIC KEY"));
    }

    #[test]
    fn test_key_hint_shows_prefix_only() {
        let key = SecretString::from("abcd1234efgh5678");
        assert_eq!(key_hint(&key), "abcd…");
    }

    #[test]
    fn test_key_hint_masks_short_values() {
        assert_eq!(key_hint(&SecretString::from("abc")), "****");
        assert_eq!(key_hint(&SecretString::from("12345678")), "****");
    }

    #[test]
    fn test_key_hint_handles_multibyte_characters() {
        let key = SecretString::from("ключ-доступа-42");
        assert_eq!(key_hint(&key), "ключ…");
    }
}
