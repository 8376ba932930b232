use crate::config::{MAX_BCRYPT_COST, MIN_BCRYPT_COST};
use crate::errors::SandError;
use common::jwt::{self, TokenClaims};
use common::secret::{ExposeSecret, SecretBox};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use ring::{
    rand::SystemRandom,
    signature::{Ed25519KeyPair, KeyPair},
};
use std::fmt;
use std::time::Duration;
use tracing::instrument;

/// Message carried by every token rejection; the reason is logged separately.
const INVALID_TOKEN_MESSAGE: &str = "The access token is invalid or expired";

/// In-memory Ed25519 signing key.
///
/// Generated once per process; tokens signed by a previous process fail the
/// `kid` check after a restart.
pub struct SigningKey {
    key_id: String,
    private_key_pkcs8: SecretBox<Vec<u8>>,
    public_key: Vec<u8>,
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("key_id", &self.key_id)
            .field("private_key_pkcs8", &"[REDACTED]")
            .finish()
    }
}

impl SigningKey {
    /// Wrap an existing PKCS#8 Ed25519 key (v1 or v2 document).
    pub fn from_pkcs8(key_id: impl Into<String>, pkcs8: Vec<u8>) -> Result<Self, SandError> {
        let key_pair = Ed25519KeyPair::from_pkcs8_maybe_unchecked(&pkcs8)
            .map_err(|e| SandError::Crypto(format!("Keypair parsing failed: {}", e)))?;
        let public_key = key_pair.public_key().as_ref().to_vec();

        Ok(Self {
            key_id: key_id.into(),
            private_key_pkcs8: SecretBox::new(Box::new(pkcs8)),
            public_key,
        })
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }
}

/// Generate a fresh EdDSA (Ed25519) signing key using the system CSPRNG.
#[instrument(skip_all)]
pub fn generate_signing_key() -> Result<SigningKey, SandError> {
    let rng = SystemRandom::new();

    let pkcs8_bytes = Ed25519KeyPair::generate_pkcs8(&rng)
        .map_err(|e| SandError::Crypto(format!("Keypair generation failed: {}", e)))?;

    let key_id = format!("sand-{}", uuid::Uuid::new_v4().simple());
    SigningKey::from_pkcs8(key_id, pkcs8_bytes.as_ref().to_vec())
}

/// Sign token claims with the process signing key.
#[instrument(skip_all)]
pub fn sign_token(claims: &TokenClaims, key: &SigningKey) -> Result<String, SandError> {
    let encoding_key = EncodingKey::from_ed_der(key.private_key_pkcs8.expose_secret());

    let mut header = Header::new(Algorithm::EdDSA);
    header.typ = Some("JWT".to_string());
    header.kid = Some(key.key_id.clone());

    encode(&header, claims, &encoding_key)
        .map_err(|e| SandError::Crypto(format!("JWT signing operation failed: {}", e)))
}

/// Verify a bearer token against the process signing key.
///
/// Validates, in order:
/// - Token size (before any parsing)
/// - `kid` header matches this process's key
/// - Signature (EdDSA only) and `exp`, with zero leeway
/// - `iat` no further than `clock_skew` in the future
#[instrument(skip_all)]
pub fn verify_token(
    token: &str,
    key: &SigningKey,
    clock_skew: Duration,
) -> Result<TokenClaims, TokenRejection> {
    let kid = jwt::extract_kid(token).map_err(|e| TokenRejection::new(e.as_label()))?;

    if kid != key.key_id {
        tracing::debug!(target: "crypto", "Token signed by an unknown key");
        return Err(TokenRejection::new("unknown_key"));
    }

    let decoding_key = DecodingKey::from_ed_der(&key.public_key);

    let mut validation = Validation::new(Algorithm::EdDSA);
    validation.validate_exp = true;
    validation.leeway = 0;

    let token_data = decode::<TokenClaims>(token, &decoding_key, &validation).map_err(|e| {
        tracing::debug!(target: "crypto", error = %e, "Token verification failed");
        match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenRejection::new("expired"),
            jsonwebtoken::errors::ErrorKind::InvalidSignature => TokenRejection::new("signature"),
            _ => TokenRejection::new("malformed"),
        }
    })?;

    jwt::validate_iat(token_data.claims.iat, clock_skew)
        .map_err(|e| TokenRejection::new(e.as_label()))?;

    Ok(token_data.claims)
}

/// Why a token was rejected; only the bounded `reason` label leaves this module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRejection {
    pub reason: &'static str,
}

impl TokenRejection {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

impl From<TokenRejection> for SandError {
    fn from(rejection: TokenRejection) -> Self {
        SandError::InvalidToken(format!("{} ({})", INVALID_TOKEN_MESSAGE, rejection.reason))
    }
}

/// Hash a password with bcrypt.
///
/// Cost is validated against the configured range even though config has
/// already checked it.
#[instrument(skip_all)]
pub fn hash_password(password: &str, cost: u32) -> Result<String, SandError> {
    if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&cost) {
        return Err(SandError::Crypto(format!(
            "Invalid bcrypt cost: {} (must be {}-{})",
            cost, MIN_BCRYPT_COST, MAX_BCRYPT_COST
        )));
    }

    bcrypt::hash(password, cost)
        .map_err(|e| SandError::Crypto(format!("Password hashing failed: {}", e)))
}

/// Verify a password against a bcrypt hash.
#[instrument(skip_all)]
pub fn verify_password(password: &str, hash: &str) -> Result<bool, SandError> {
    bcrypt::verify(password, hash)
        .map_err(|e| SandError::Crypto(format!("Password verification failed: {}", e)))
}
