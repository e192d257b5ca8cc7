//! Request authentication and authorization.
//!
//! Components, leaf first:
//!
//! - `claims` - decoded token record and the downstream claim set
//! - `cache` - API key → token cache with lazy expiry
//! - `verifier` - signature and expiry verification
//! - `credentials` - bearer token / API key extraction
//! - `exchange` - API key → token exchange over HTTP
//! - `authorization` - product → proxy policy
//! - `propagation` - claims header handling
//! - `pipeline` - the state machine tying them together

pub mod authorization;
pub mod cache;
pub mod claims;
pub mod credentials;
pub mod exchange;
pub mod pipeline;
pub mod propagation;
pub mod verifier;

pub use authorization::AuthorizationPolicy;
pub use cache::TokenCache;
pub use claims::{DecodedToken, DownstreamClaims};
pub use credentials::{Credential, CredentialMode, CredentialResolver};
pub use exchange::{ApiKeyExchange, HttpApiKeyExchanger};
pub use pipeline::{AuthGate, AuthOutcome, BypassReason, GatePolicy, GateRequest};
pub use propagation::CLAIMS_HEADER;
pub use verifier::{TokenVerifier, VerifierSettings};
