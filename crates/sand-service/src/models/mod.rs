use crate::errors::SandError;
use common::secret::SecretString;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The single known credential, built once at startup.
#[derive(Clone)]
pub struct Credential {
    pub username: String,
    pub password_hash: SecretString,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &"[REDACTED]")
            .field("password_hash", &"[REDACTED]")
            .finish()
    }
}

/// Caller identity resolved from a valid bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub username: String,
}

/// `POST /login` form body.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: SecretString,
}

/// Token response (OAuth 2.0 password flow shape)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

impl TokenResponse {
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
        }
    }
}

/// `POST /upload` form body, kept as raw strings so that bad values become
/// `InvalidInput` instead of an extractor rejection.
#[derive(Debug, Default, Deserialize)]
pub struct PredictionForm {
    pub date_receive: Option<String>,
    pub plant: Option<String>,
    pub vendor: Option<String>,
    pub fines: Option<String>,
    pub bulk: Option<String>,
}

/// Validated prediction input.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRequest {
    /// Receipt date as `day.month.year`; parsed during feature derivation.
    pub date_receive: String,
    pub plant: String,
    pub vendor: String,
    pub fines: f64,
    pub bulk: f64,
}

impl TryFrom<PredictionForm> for PredictionRequest {
    type Error = SandError;

    fn try_from(form: PredictionForm) -> Result<Self, Self::Error> {
        let date_receive = required(form.date_receive, "date_receive")?;
        let plant = required(form.plant, "plant")?;
        let vendor = required(form.vendor, "vendor")?;
        let fines = parse_measurement(&required(form.fines, "fines")?, "fines")?;
        let bulk = parse_measurement(&required(form.bulk, "bulk")?, "bulk")?;

        Ok(Self {
            date_receive,
            plant,
            vendor,
            fines,
            bulk,
        })
    }
}

fn required(value: Option<String>, field: &str) -> Result<String, SandError> {
    value.ok_or_else(|| SandError::InvalidInput(format!("missing field: {}", field)))
}

/// Parse a numeric reading; NaN and infinities are rejected.
pub fn parse_measurement(raw: &str, field: &str) -> Result<f64, SandError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| SandError::InvalidInput(format!("{} must be a number", field)))
}

/// Fully derived, model-ready representation of one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureVector {
    pub month: u32,
    pub season: String,
    pub plant: String,
    pub vendor: String,
    pub region: String,
    pub fines: f64,
    pub bulk: f64,
}

/// Successful `/upload` response.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub sand_predict_value: f64,
    pub total_sand_value: f64,
}

/// `/ready` response body.
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub status: &'static str,
    pub model: &'static str,
    pub season_entries: usize,
    pub region_entries: usize,
}
