//! Service error types.
//!
//! Auth Gate failures are the only errors that leave as non-200 responses.
//! Prediction failures are reported as a 200 `{"error": ...}` payload, and
//! internal detail is logged server-side only.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Message returned for every inference failure.
pub const GENERIC_PREDICTION_ERROR: &str = "An error occurred processing your request.";

#[derive(Debug, Error)]
pub enum SandError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Inference failure: {0}")]
    InferenceFailure(String),

    #[error("Cryptographic error: {0}")]
    Crypto(String),
}

impl SandError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            SandError::InvalidCredentials | SandError::InvalidToken(_) => StatusCode::UNAUTHORIZED,
            SandError::InvalidInput(_) | SandError::InferenceFailure(_) => StatusCode::OK,
            SandError::Crypto(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Bounded label for metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            SandError::InvalidCredentials => "invalid_credentials",
            SandError::InvalidToken(_) => "invalid_token",
            SandError::InvalidInput(_) => "invalid_input",
            SandError::InferenceFailure(_) => "inference_failure",
            SandError::Crypto(_) => "crypto",
        }
    }
}

/// Body for 401/500 responses.
#[derive(Serialize)]
struct DetailResponse {
    detail: &'static str,
}

/// Body for prediction failures.
#[derive(Serialize)]
pub struct PredictionErrorResponse {
    pub error: String,
}

impl IntoResponse for SandError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match self {
            SandError::InvalidCredentials => unauthorized("Incorrect username or password"),
            SandError::InvalidToken(reason) => {
                tracing::debug!(target: "sand.auth", reason = %reason, "Token rejected");
                unauthorized("Could not validate credentials")
            }
            SandError::InvalidInput(message) => {
                (status, Json(PredictionErrorResponse { error: message })).into_response()
            }
            SandError::InferenceFailure(detail) => {
                tracing::error!(target: "sand.inference", error = %detail, "Error in upload endpoint");
                (
                    status,
                    Json(PredictionErrorResponse {
                        error: GENERIC_PREDICTION_ERROR.to_string(),
                    }),
                )
                    .into_response()
            }
            SandError::Crypto(detail) => {
                tracing::error!(target: "sand.crypto", error = %detail, "Cryptographic operation failed");
                (
                    status,
                    Json(DetailResponse {
                        detail: "Internal server error",
                    }),
                )
                    .into_response()
            }
        }
    }
}

fn unauthorized(detail: &'static str) -> Response {
    let mut response = (StatusCode::UNAUTHORIZED, Json(DetailResponse { detail })).into_response();
    response
        .headers_mut()
        .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::body::Body;
    use http_body_util::BodyExt;

    async fn read_body_json(body: Body) -> serde_json::Value {
        let bytes = body.collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(
            SandError::InvalidCredentials.to_string(),
            "Invalid credentials"
        );
        assert_eq!(
            SandError::InvalidInput("fines must be a number".to_string()).to_string(),
            "Invalid input: fines must be a number"
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            SandError::InvalidCredentials.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            SandError::InvalidToken("expired".to_string()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            SandError::InvalidInput("x".to_string()).status_code(),
            StatusCode::OK
        );
        assert_eq!(
            SandError::InferenceFailure("x".to_string()).status_code(),
            StatusCode::OK
        );
        assert_eq!(
            SandError::Crypto("x".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_invalid_credentials_response() {
        let response = SandError::InvalidCredentials.into_response();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get("www-authenticate").unwrap(),
            "Bearer"
        );

        let body = read_body_json(response.into_body()).await;
        assert_eq!(body["detail"], "Incorrect username or password");
    }

    #[tokio::test]
    async fn test_invalid_token_hides_reason() {
        let response = SandError::InvalidToken("signature mismatch".to_string()).into_response();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().contains_key("www-authenticate"));

        let body = read_body_json(response.into_body()).await;
        assert_eq!(body["detail"], "Could not validate credentials");
        assert!(!body.to_string().contains("signature"));
    }

    #[tokio::test]
    async fn test_invalid_input_is_structured_200() {
        let response =
            SandError::InvalidInput("date_receive must be day.month.year".to_string())
                .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        let body = read_body_json(response.into_body()).await;
        assert_eq!(body, serde_json::json!({"error": "date_receive must be day.month.year"}));
    }

    #[tokio::test]
    async fn test_inference_failure_is_generic() {
        let response =
            SandError::InferenceFailure("unknown category 'X' for vendor".to_string())
                .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        let body = read_body_json(response.into_body()).await;
        assert_eq!(body, serde_json::json!({"error": GENERIC_PREDICTION_ERROR}));
    }

    #[tokio::test]
    async fn test_crypto_error_is_500_without_detail() {
        let response = SandError::Crypto("pkcs8 parse failed".to_string()).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = read_body_json(response.into_body()).await;
        assert!(!body.to_string().contains("pkcs8"));
    }
}
