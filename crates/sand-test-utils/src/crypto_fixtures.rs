//! Deterministic cryptographic fixtures for testing
//!
//! Provides reproducible Ed25519 signing keys. All fixtures are
//! deterministic based on seed values.

use ring::signature::{Ed25519KeyPair, KeyPair};
use sand_service::crypto::SigningKey;
use thiserror::Error;

/// Test fixture error type
#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("Cryptographic operation failed: {0}")]
    Crypto(String),
}

/// Key id given to the fixture key for `seed`.
pub fn test_key_id(seed: u8) -> String {
    format!("test-key-{:03}", seed)
}

/// Deterministic 32-byte Ed25519 seed.
fn seed_bytes(seed: u8) -> [u8; 32] {
    let mut bytes = [0u8; 32];
    for (i, byte) in bytes.iter_mut().enumerate() {
        *byte = seed.wrapping_mul(i as u8).wrapping_add(i as u8);
    }
    bytes[0] = seed;
    bytes
}

/// Generate a deterministic Ed25519 signing key for testing.
///
/// The same seed always produces the same keypair and key id.
///
/// # Example
/// ```rust,ignore
/// let key = test_signing_key(1)?;
/// let again = test_signing_key(1)?;
/// assert_eq!(key.public_key(), again.public_key());
/// ```
pub fn test_signing_key(seed: u8) -> Result<SigningKey, FixtureError> {
    let pkcs8 = build_pkcs8_from_seed(&seed_bytes(seed));

    SigningKey::from_pkcs8(test_key_id(seed), pkcs8)
        .map_err(|e| FixtureError::Crypto(format!("Failed to load test keypair: {}", e)))
}

/// Raw public key for `seed`, derived independently of [`SigningKey`].
pub fn test_public_key(seed: u8) -> Result<Vec<u8>, FixtureError> {
    let key_pair = Ed25519KeyPair::from_seed_unchecked(&seed_bytes(seed))
        .map_err(|e| FixtureError::Crypto(format!("Failed to generate test keypair: {:?}", e)))?;
    Ok(key_pair.public_key().as_ref().to_vec())
}

/// Build PKCS#8 v1 document from Ed25519 seed
///
/// This is a test-only utility. Production code must use ring::rand::SystemRandom.
fn build_pkcs8_from_seed(seed: &[u8; 32]) -> Vec<u8> {
    // PKCS#8 v1 format for Ed25519 (RFC 5208):
    // SEQUENCE {
    //   version         INTEGER (0),
    //   algorithm       AlgorithmIdentifier,
    //   privateKey      OCTET STRING
    // }
    // Where privateKey for Ed25519 is:
    // OCTET STRING containing OCTET STRING with 32-byte seed

    let mut pkcs8 = Vec::with_capacity(48);

    // Outer SEQUENCE, 46 bytes
    pkcs8.extend_from_slice(&[0x30, 0x2e]);

    // Version: INTEGER 0
    pkcs8.extend_from_slice(&[0x02, 0x01, 0x00]);

    // AlgorithmIdentifier: SEQUENCE { OID 1.3.101.112 }
    pkcs8.extend_from_slice(&[0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x70]);

    // Private key: OCTET STRING (34) wrapping OCTET STRING (32)
    pkcs8.extend_from_slice(&[0x04, 0x22, 0x04, 0x20]);
    pkcs8.extend_from_slice(seed);

    pkcs8
}
