//! Sand prediction service configuration.
//!
//! Configuration is loaded from environment variables. Password material is
//! redacted in Debug output.

use common::config::ObservabilityConfig;
use common::jwt::{DEFAULT_CLOCK_SKEW, MAX_CLOCK_SKEW};
use common::secret::{ExposeSecret, SecretString};
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Default HTTP bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8000";

/// Default model artifact location.
pub const DEFAULT_MODEL_PATH: &str = "./model.json";

/// Default lookup-table location.
pub const DEFAULT_MASTERDATA_PATH: &str = "./masterdata.json";

/// Default bearer token lifetime in minutes.
pub const DEFAULT_TOKEN_EXPIRY_MINUTES: u64 = 30;

/// Upper bound on token lifetime (one day).
pub const MAX_TOKEN_EXPIRY_MINUTES: u64 = 1440;

/// Default bcrypt cost factor (2^12 iterations, ~200ms).
pub const DEFAULT_BCRYPT_COST: u32 = 12;

/// Minimum accepted bcrypt cost.
pub const MIN_BCRYPT_COST: u32 = 10;

/// Maximum accepted bcrypt cost.
pub const MAX_BCRYPT_COST: u32 = 14;

/// Default JWT clock skew tolerance in seconds.
#[allow(clippy::cast_possible_wrap)]
pub const DEFAULT_JWT_CLOCK_SKEW_SECONDS: i64 = DEFAULT_CLOCK_SKEW.as_secs() as i64;

/// Default number of model invocations allowed to run at once.
pub const DEFAULT_MAX_CONCURRENT_INFERENCES: usize = 4;

/// Default transport-level request timeout.
pub const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 30;

/// Where the single credential's password comes from.
#[derive(Clone)]
pub enum PasswordSource {
    /// A bcrypt hash, verified as-is.
    Hash(SecretString),
    /// A plaintext password, hashed once at startup.
    Plaintext(SecretString),
}

impl fmt::Debug for PasswordSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PasswordSource::Hash(_) => f.write_str("Hash([REDACTED])"),
            PasswordSource::Plaintext(_) => f.write_str("Plaintext([REDACTED])"),
        }
    }
}

/// Allowed CORS origins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsOrigins {
    /// Any origin (`*`).
    Any,
    /// Explicit origin list.
    List(Vec<String>),
}

/// Service configuration.
#[derive(Clone)]
pub struct Config {
    /// Server bind address (default: "0.0.0.0:8000").
    pub bind_address: String,

    /// Username of the single known credential.
    pub username: String,

    /// Password material for the single known credential.
    pub password: PasswordSource,

    /// Path to the model artifact.
    pub model_path: PathBuf,

    /// Path to the season/region lookup tables.
    pub masterdata_path: PathBuf,

    /// Bearer token lifetime in minutes.
    pub token_expiry_minutes: u64,

    /// JWT clock skew tolerance in seconds for iat validation.
    pub jwt_clock_skew_seconds: i64,

    /// Bcrypt cost used when hashing a plaintext password.
    pub bcrypt_cost: u32,

    /// Concurrency limit for model invocations.
    pub max_concurrent_inferences: usize,

    /// CORS origins.
    pub cors_allowed_origins: CorsOrigins,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,

    /// Logging configuration.
    pub observability: ObservabilityConfig,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bind_address", &self.bind_address)
            .field("username", &"[REDACTED]")
            .field("password", &self.password)
            .field("model_path", &self.model_path)
            .field("masterdata_path", &self.masterdata_path)
            .field("token_expiry_minutes", &self.token_expiry_minutes)
            .field("jwt_clock_skew_seconds", &self.jwt_clock_skew_seconds)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("max_concurrent_inferences", &self.max_concurrent_inferences)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .field("observability", &self.observability)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid password hash: {0}")]
    InvalidPasswordHash(String),

    #[error("Invalid token expiry configuration: {0}")]
    InvalidTokenExpiry(String),

    #[error("Invalid JWT clock skew configuration: {0}")]
    InvalidJwtClockSkew(String),

    #[error("Invalid bcrypt cost configuration: {0}")]
    InvalidBcryptCost(String),

    #[error("Invalid inference concurrency configuration: {0}")]
    InvalidConcurrency(String),

    #[error("Invalid request timeout configuration: {0}")]
    InvalidRequestTimeout(String),
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing)
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let username = vars
            .get("SAND_USERNAME")
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("SAND_USERNAME".to_string()))?
            .clone();

        let password = parse_password_source(vars)?;

        let model_path = vars
            .get("MODEL_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH));

        let masterdata_path = vars
            .get("MASTERDATA_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MASTERDATA_PATH));

        let token_expiry_minutes = if let Some(value_str) = vars.get("TOKEN_EXPIRY_MINUTES") {
            let value: u64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidTokenExpiry(format!(
                    "TOKEN_EXPIRY_MINUTES must be a valid integer, got '{}': {}",
                    value_str, e
                ))
            })?;

            if value == 0 || value > MAX_TOKEN_EXPIRY_MINUTES {
                return Err(ConfigError::InvalidTokenExpiry(format!(
                    "TOKEN_EXPIRY_MINUTES must be between 1 and {}, got {}",
                    MAX_TOKEN_EXPIRY_MINUTES, value
                )));
            }

            value
        } else {
            DEFAULT_TOKEN_EXPIRY_MINUTES
        };

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

            #[allow(clippy::cast_possible_wrap)]
            let max = MAX_CLOCK_SKEW.as_secs() as i64;
            if value > max {
                return Err(ConfigError::InvalidJwtClockSkew(format!(
                    "JWT_CLOCK_SKEW_SECONDS must not exceed {} seconds, got {}",
                    max, value
                )));
            }

            value
        } else {
            DEFAULT_JWT_CLOCK_SKEW_SECONDS
        };

        let bcrypt_cost = if let Some(value_str) = vars.get("BCRYPT_COST") {
            let value: u32 = value_str.parse().map_err(|e| {
                ConfigError::InvalidBcryptCost(format!(
                    "BCRYPT_COST must be a valid integer, got '{}': {}",
                    value_str, e
                ))
            })?;

            if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&value) {
                return Err(ConfigError::InvalidBcryptCost(format!(
                    "BCRYPT_COST must be between {} and {}, got {}",
                    MIN_BCRYPT_COST, MAX_BCRYPT_COST, value
                )));
            }

            value
        } else {
            DEFAULT_BCRYPT_COST
        };

        let max_concurrent_inferences =
            if let Some(value_str) = vars.get("MAX_CONCURRENT_INFERENCES") {
                let value: usize = value_str.parse().map_err(|e| {
                    ConfigError::InvalidConcurrency(format!(
                        "MAX_CONCURRENT_INFERENCES must be a valid positive integer, got '{}': {}",
                        value_str, e
                    ))
                })?;

                if value == 0 {
                    return Err(ConfigError::InvalidConcurrency(
                        "MAX_CONCURRENT_INFERENCES must be greater than 0".to_string(),
                    ));
                }

                value
            } else {
                DEFAULT_MAX_CONCURRENT_INFERENCES
            };

        let cors_allowed_origins = parse_cors_origins(vars.get("CORS_ALLOWED_ORIGINS"));

        let request_timeout_seconds = if let Some(value_str) = vars.get("REQUEST_TIMEOUT_SECONDS")
        {
            let value: u64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidRequestTimeout(format!(
                    "REQUEST_TIMEOUT_SECONDS must be a valid positive integer, got '{}': {}",
                    value_str, e
                ))
            })?;

            if value == 0 {
                return Err(ConfigError::InvalidRequestTimeout(
                    "REQUEST_TIMEOUT_SECONDS must be greater than 0".to_string(),
                ));
            }

            value
        } else {
            DEFAULT_REQUEST_TIMEOUT_SECONDS
        };

        Ok(Config {
            bind_address,
            username,
            password,
            model_path,
            masterdata_path,
            token_expiry_minutes,
            jwt_clock_skew_seconds,
            bcrypt_cost,
            max_concurrent_inferences,
            cors_allowed_origins,
            request_timeout_seconds,
            observability: ObservabilityConfig::from_vars(vars),
        })
    }
}

/// `SAND_PASSWORD_HASH` wins over `SAND_PASSWORD`; at least one is required.
fn parse_password_source(vars: &HashMap<String, String>) -> Result<PasswordSource, ConfigError> {
    if let Some(hash) = vars.get("SAND_PASSWORD_HASH") {
        let hash = SecretString::from(hash.trim().to_string());
        validate_bcrypt_hash(hash.expose_secret())?;
        return Ok(PasswordSource::Hash(hash));
    }

    match vars.get("SAND_PASSWORD").filter(|v| !v.is_empty()) {
        Some(plain) => Ok(PasswordSource::Plaintext(SecretString::from(plain.clone()))),
        None => Err(ConfigError::MissingEnvVar(
            "SAND_PASSWORD_HASH or SAND_PASSWORD".to_string(),
        )),
    }
}

/// Structural check of a modular-crypt bcrypt hash (`$2b$12$<53 chars>`).
pub fn validate_bcrypt_hash(hash: &str) -> Result<(), ConfigError> {
    const BCRYPT_HASH_LEN: usize = 60;

    if hash.len() != BCRYPT_HASH_LEN {
        return Err(ConfigError::InvalidPasswordHash(format!(
            "expected {} characters, got {}",
            BCRYPT_HASH_LEN,
            hash.len()
        )));
    }

    let mut parts = hash.split('$');
    let (empty, version, cost, rest) = (parts.next(), parts.next(), parts.next(), parts.next());

    if empty != Some("") || rest.is_none() || parts.next().is_some() {
        return Err(ConfigError::InvalidPasswordHash(
            "not in $<version>$<cost>$<salt+hash> format".to_string(),
        ));
    }

    if !matches!(version, Some("2a" | "2b" | "2x" | "2y")) {
        return Err(ConfigError::InvalidPasswordHash(
            "unsupported bcrypt version".to_string(),
        ));
    }

    if !cost.is_some_and(|c| c.len() == 2 && c.parse::<u32>().is_ok()) {
        return Err(ConfigError::InvalidPasswordHash(
            "invalid cost field".to_string(),
        ));
    }

    Ok(())
}

fn parse_cors_origins(value: Option<&String>) -> CorsOrigins {
    let Some(value) = value.map(|v| v.trim()).filter(|v| !v.is_empty()) else {
        return CorsOrigins::Any;
    };

    if value == "*" {
        return CorsOrigins::Any;
    }

    CorsOrigins::List(
        value
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(ToString::to_string)
            .collect(),
    )
}
