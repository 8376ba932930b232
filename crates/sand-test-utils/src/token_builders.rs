//! Builder patterns for test data construction
//!
//! Provides fluent APIs for creating test tokens.

use chrono::{Duration, Utc};
use common::jwt::TokenClaims;
use sand_service::crypto::{sign_token, SigningKey};

/// Builder for creating test token claims
///
/// # Example
/// ```rust,ignore
/// let token = TestTokenBuilder::new()
///     .for_user("alice")
///     .expires_in(3600)
///     .sign_with(&test_signing_key(1)?);
/// ```
pub struct TestTokenBuilder {
    sub: String,
    exp: i64,
    iat: i64,
}

impl TestTokenBuilder {
    /// Create a new token builder with defaults
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            sub: crate::fixtures::TEST_USERNAME.to_string(),
            exp: (now + Duration::seconds(1800)).timestamp(),
            iat: now.timestamp(),
        }
    }

    /// Set the subject
    pub fn for_user(mut self, subject: &str) -> Self {
        self.sub = subject.to_string();
        self
    }

    /// Set expiration in seconds from now (negative for an expired token)
    pub fn expires_in(mut self, seconds: i64) -> Self {
        self.exp = (Utc::now() + Duration::seconds(seconds)).timestamp();
        self
    }

    /// Set issued-at timestamp
    pub fn issued_at(mut self, timestamp: i64) -> Self {
        self.iat = timestamp;
        self
    }

    pub fn build(self) -> TokenClaims {
        TokenClaims {
            sub: self.sub,
            exp: self.exp,
            iat: self.iat,
        }
    }

    /// Build and sign with the given key.
    pub fn sign_with(self, key: &SigningKey) -> String {
        sign_token(&self.build(), key).expect("signing test token")
    }
}

impl Default for TestTokenBuilder {
    fn default() -> Self {
        Self::new()
    }
}
