use crate::config::{Config, PasswordSource, DEFAULT_BCRYPT_COST};
use crate::crypto::{self, SigningKey};
use crate::errors::SandError;
use crate::models::{Credential, Identity, TokenResponse};
use crate::observability::hash_for_correlation;
use crate::observability::metrics::{record_login, record_token_validation};
use crate::observability::ErrorCategory;
use common::jwt::TokenClaims;
use common::secret::{ExposeSecret, SecretString};
use std::time::Duration;
use tracing::instrument;

/// Immutable authentication settings, built once from [`Config`].
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub credential: Credential,
    pub token_lifetime: Duration,
    pub clock_skew: Duration,
}

impl AuthConfig {
    /// Resolve the credential; a plaintext password is hashed here, exactly once.
    #[instrument(skip_all)]
    pub fn from_config(config: &Config) -> Result<Self, SandError> {
        let password_hash = match &config.password {
            PasswordSource::Hash(hash) => hash.clone(),
            PasswordSource::Plaintext(plain) => {
                tracing::info!(target: "sand.auth", "Hashing plaintext password from environment");
                SecretString::from(crypto::hash_password(
                    plain.expose_secret(),
                    config.bcrypt_cost,
                )?)
            }
        };

        Ok(Self {
            credential: Credential {
                username: config.username.clone(),
                password_hash,
            },
            token_lifetime: Duration::from_secs(config.token_expiry_minutes * 60),
            clock_skew: Duration::from_secs(config.jwt_clock_skew_seconds.unsigned_abs()),
        })
    }
}

/// Issues and checks bearer tokens for the single configured credential.
pub struct AuthGate {
    config: AuthConfig,
    signing_key: SigningKey,
    /// Verified against when the username is unknown, at the real hash's cost.
    dummy_hash: SecretString,
}

impl AuthGate {
    pub fn new(config: AuthConfig, signing_key: SigningKey) -> Result<Self, SandError> {
        let cost = bcrypt_cost_of(config.credential.password_hash.expose_secret());
        let filler = uuid::Uuid::new_v4().to_string();
        let dummy_hash = bcrypt::hash(filler, cost)
            .map_err(|e| SandError::Crypto(format!("Dummy hash generation failed: {}", e)))?;

        tracing::info!(
            target: "sand.auth",
            key_id = %signing_key.key_id(),
            token_lifetime_secs = config.token_lifetime.as_secs(),
            "Auth gate ready"
        );

        Ok(Self {
            config,
            signing_key,
            dummy_hash: SecretString::from(dummy_hash),
        })
    }

    pub fn key_id(&self) -> &str {
        self.signing_key.key_id()
    }

    /// Exchange a username and password for a bearer token.
    ///
    /// Runs one bcrypt verification whether or not the username matches.
    /// Blocking; call from a blocking context.
    #[instrument(skip_all, name = "sand.auth.login", fields(user = %hash_for_correlation(username)))]
    pub fn login(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<TokenResponse, SandError> {
        let credential = &self.config.credential;
        let known_user = username == credential.username;

        let hash_to_verify = if known_user {
            credential.password_hash.expose_secret()
        } else {
            self.dummy_hash.expose_secret()
        };

        let password_ok = crypto::verify_password(password.expose_secret(), hash_to_verify)?;

        if !(known_user && password_ok) {
            record_login("error");
            tracing::info!(target: "sand.auth", "Login rejected");
            return Err(SandError::InvalidCredentials);
        }

        let token = self.issue_token(&credential.username)?;
        record_login("success");
        tracing::info!(target: "sand.auth", "Token issued");

        Ok(TokenResponse::bearer(token))
    }

    fn issue_token(&self, subject: &str) -> Result<String, SandError> {
        let claims = TokenClaims::new(
            subject.to_string(),
            chrono::Utc::now().timestamp(),
            self.config.token_lifetime,
        );
        crypto::sign_token(&claims, &self.signing_key)
    }

    /// Resolve a bearer token to the caller's identity.
    #[instrument(skip_all, name = "sand.auth.authenticate")]
    pub fn authenticate(&self, token: &str) -> Result<Identity, SandError> {
        let result = crypto::verify_token(token, &self.signing_key, self.config.clock_skew)
            .map_err(SandError::from)
            .and_then(|claims| {
                if claims.sub == self.config.credential.username {
                    Ok(Identity {
                        username: claims.sub,
                    })
                } else {
                    Err(SandError::InvalidToken("unknown subject".to_string()))
                }
            });

        match &result {
            Ok(_) => record_token_validation("success", None),
            Err(e) => record_token_validation("error", Some(ErrorCategory::from(e).as_str())),
        }

        result
    }
}

/// Cost factor encoded in a `$2b$NN$...` hash.
fn bcrypt_cost_of(hash: &str) -> u32 {
    hash.get(4..6)
        .and_then(|cost| cost.parse().ok())
        .unwrap_or(DEFAULT_BCRYPT_COST)
}
