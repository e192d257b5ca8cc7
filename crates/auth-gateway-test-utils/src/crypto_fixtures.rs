//! Deterministic cryptographic fixtures for testing
//!
//! Provides reproducible Ed25519 keypairs. The same seed always yields the
//! same key, so a token signed in one test can be verified in another.

use base64::engine::general_purpose;
use base64::Engine;
use jsonwebtoken::{DecodingKey, EncodingKey};
use ring::signature::{Ed25519KeyPair, KeyPair};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("Cryptographic operation failed: {0}")]
    Crypto(String),
}

/// DER prefix of an Ed25519 SubjectPublicKeyInfo (RFC 8410), followed by
/// the 32-byte public key.
const ED25519_SPKI_PREFIX: [u8; 12] = [
    0x30, 0x2a, 0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x70, 0x03, 0x21, 0x00,
];

/// Deterministic Ed25519 keypair.
#[derive(Clone)]
pub struct TestKeypair {
    seed: u8,
    pkcs8: Vec<u8>,
    public_key: Vec<u8>,
}

impl TestKeypair {
    /// Derive a keypair from `seed`.
    ///
    /// # Panics
    ///
    /// Panics if ring rejects the derived seed.
    pub fn new(seed: u8) -> Self {
        Self::try_new(seed).expect("Ed25519 keypair from fixed seed")
    }

    /// Derive a keypair from `seed`, reporting ring failures.
    pub fn try_new(seed: u8) -> Result<Self, FixtureError> {
        let seed_bytes = seed_bytes(seed);
        let key_pair = Ed25519KeyPair::from_seed_unchecked(&seed_bytes)
            .map_err(|e| FixtureError::Crypto(format!("Ed25519 seed rejected: {}", e)))?;

        Ok(Self {
            seed,
            pkcs8: build_pkcs8_from_seed(&seed_bytes),
            public_key: key_pair.public_key().as_ref().to_vec(),
        })
    }

    pub fn seed(&self) -> u8 {
        self.seed
    }

    /// Public key as a SubjectPublicKeyInfo PEM.
    pub fn public_key_pem(&self) -> String {
        let mut der = ED25519_SPKI_PREFIX.to_vec();
        der.extend_from_slice(&self.public_key);
        format!(
            "-----BEGIN PUBLIC KEY-----\n{}\n-----END PUBLIC KEY-----\n",
            general_purpose::STANDARD.encode(der)
        )
    }

    /// Public key PEM with newlines escaped, as it appears in an env var.
    pub fn public_key_pem_escaped(&self) -> String {
        self.public_key_pem().replace('\n', "\\n")
    }

    pub fn encoding_key(&self) -> EncodingKey {
        EncodingKey::from_ed_der(&self.pkcs8)
    }

    pub fn decoding_key(&self) -> DecodingKey {
        DecodingKey::from_ed_der(&self.public_key)
    }
}

fn seed_bytes(seed: u8) -> [u8; 32] {
    let mut seed_bytes = [0u8; 32];
    seed_bytes[0] = seed;
    for (i, byte) in seed_bytes.iter_mut().enumerate().skip(1) {
        *byte = seed.wrapping_mul(i as u8).wrapping_add(i as u8);
    }
    seed_bytes
}

/// Build a PKCS#8 v1 document from an Ed25519 seed.
///
/// Test-only; ring does not expose PKCS#8 for seed-derived keys.
fn build_pkcs8_from_seed(seed: &[u8; 32]) -> Vec<u8> {
    let mut pkcs8 = Vec::with_capacity(48);

    // SEQUENCE, 46 bytes
    pkcs8.extend_from_slice(&[0x30, 0x2e]);
    // version INTEGER 0
    pkcs8.extend_from_slice(&[0x02, 0x01, 0x00]);
    // AlgorithmIdentifier: OID 1.3.101.112 (Ed25519)
    pkcs8.extend_from_slice(&[0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x70]);
    // privateKey OCTET STRING wrapping OCTET STRING(32)
    pkcs8.extend_from_slice(&[0x04, 0x22, 0x04, 0x20]);
    pkcs8.extend_from_slice(seed);

    pkcs8
}
