//! Fixed credentials, lookup tables and predictors.

use crate::crypto_fixtures::{test_signing_key, FixtureError};
use common::secret::SecretString;
use sand_service::inference::{Predictor, PredictorError};
use sand_service::masterdata::LookupTables;
use sand_service::models::{Credential, FeatureVector};
use sand_service::services::auth_service::{AuthConfig, AuthGate};
use std::collections::HashMap;
use std::sync::OnceLock;
use std::time::Duration;

pub const TEST_USERNAME: &str = "plant-operator";
pub const TEST_PASSWORD: &str = "sieve-and-weigh-42";

/// Lowest cost bcrypt accepts; keeps tests fast.
pub const TEST_BCRYPT_COST: u32 = 4;

pub const TEST_TOKEN_LIFETIME: Duration = Duration::from_secs(30 * 60);

pub const TEST_CLOCK_SKEW: Duration = Duration::from_secs(300);

/// bcrypt hash of [`TEST_PASSWORD`], computed once per test binary.
pub fn test_password_hash() -> &'static str {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| {
        bcrypt::hash(TEST_PASSWORD, TEST_BCRYPT_COST).expect("bcrypt hash of test password")
    })
}

pub fn test_auth_config() -> AuthConfig {
    AuthConfig {
        credential: Credential {
            username: TEST_USERNAME.to_string(),
            password_hash: SecretString::from(test_password_hash().to_string()),
        },
        token_lifetime: TEST_TOKEN_LIFETIME,
        clock_skew: TEST_CLOCK_SKEW,
    }
}

/// Auth gate signing with the deterministic key for `seed`.
pub fn test_auth_gate(seed: u8) -> Result<AuthGate, FixtureError> {
    AuthGate::new(test_auth_config(), test_signing_key(seed)?)
        .map_err(|e| FixtureError::Crypto(e.to_string()))
}

/// March is Spring, vendor V1 is North; everything else is Unknown.
pub fn test_lookup_tables() -> LookupTables {
    LookupTables::new(
        HashMap::from([
            (12, "Winter".to_string()),
            (1, "Winter".to_string()),
            (2, "Winter".to_string()),
            (3, "Spring".to_string()),
            (4, "Spring".to_string()),
            (5, "Spring".to_string()),
        ]),
        HashMap::from([
            ("V1".to_string(), "North".to_string()),
            ("V2".to_string(), "South".to_string()),
        ]),
    )
}

/// Returns the same value for every input.
#[derive(Debug, Clone, Copy)]
pub struct FixedPredictor(pub f64);

impl Predictor for FixedPredictor {
    fn predict(&self, _features: &FeatureVector) -> Result<f64, PredictorError> {
        Ok(self.0)
    }

    fn kind(&self) -> &'static str {
        "fixed"
    }
}

/// Always fails with the given message.
#[derive(Debug, Clone)]
pub struct FailingPredictor(pub String);

impl Predictor for FailingPredictor {
    fn predict(&self, _features: &FeatureVector) -> Result<f64, PredictorError> {
        Err(PredictorError::Other(self.0.clone()))
    }

    fn kind(&self) -> &'static str {
        "failing"
    }
}

/// Panics inside the blocking pool.
#[derive(Debug, Clone, Copy)]
pub struct PanickingPredictor;

impl Predictor for PanickingPredictor {
    fn predict(&self, _features: &FeatureVector) -> Result<f64, PredictorError> {
        panic!("predictor panicked");
    }

    fn kind(&self) -> &'static str {
        "panicking"
    }
}

/// Echoes a feature back so tests can see what the model received.
///
/// Returns `month * 10 + 1` when the season is known, `month * 10` otherwise.
#[derive(Debug, Clone, Copy)]
pub struct EchoPredictor;

impl Predictor for EchoPredictor {
    fn predict(&self, features: &FeatureVector) -> Result<f64, PredictorError> {
        let known = if features.season == sand_service::masterdata::UNKNOWN {
            0.0
        } else {
            1.0
        };
        Ok(f64::from(features.month) * 10.0 + known)
    }

    fn kind(&self) -> &'static str {
        "echo"
    }
}
