//! Observability for the sand prediction service.
//!
//! # Privacy by Default
//!
//! All instrumentation uses `#[instrument(skip_all)]` and explicit safe field allow-listing.
//! Fields are categorized as:
//! - **SAFE**: Can be logged in plaintext (plant, vendor, derived season/region, outcomes)
//! - **HASHED**: Must be SHA-256 hashed for correlation (username)
//! - **NEVER**: Must never appear in logs (passwords, hashes, tokens, keys)

pub mod metrics;

use sha2::{Digest, Sha256};

/// Hash a field value for correlation in logs (SHA-256, first 8 hex chars)
///
/// Used for the login username, which needs correlation across log entries
/// but should not be stored in plaintext.
pub fn hash_for_correlation(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    let result = hasher.finalize();
    // 32 bits: enough for correlation, limits reversibility
    hex::encode(result.get(..4).unwrap_or_default())
}

/// Error categories for metrics labels (bounded cardinality)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad username/password, bad or expired token
    Authentication,
    /// Request could not be turned into features
    Input,
    /// Model evaluation failed
    Inference,
    /// Key handling, hashing
    Internal,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Authentication => "authentication",
            ErrorCategory::Input => "input",
            ErrorCategory::Inference => "inference",
            ErrorCategory::Internal => "internal",
        }
    }
}

impl From<&crate::errors::SandError> for ErrorCategory {
    fn from(err: &crate::errors::SandError) -> Self {
        use crate::errors::SandError;
        match err {
            SandError::InvalidCredentials | SandError::InvalidToken(_) => {
                ErrorCategory::Authentication
            }
            SandError::InvalidInput(_) => ErrorCategory::Input,
            SandError::InferenceFailure(_) => ErrorCategory::Inference,
            SandError::Crypto(_) => ErrorCategory::Internal,
        }
    }
}
