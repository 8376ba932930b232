//! Bearer-token authentication for protected routes.

use crate::errors::SandError;
use crate::routes::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::instrument;

/// Authentication middleware that validates bearer tokens.
///
/// Extracts the token from the Authorization header, resolves it to an
/// [`Identity`](crate::models::Identity), and stores that in request
/// extensions for handlers.
///
/// # Authorization Header Format
///
/// ```text
/// Authorization: Bearer <token>
/// ```
///
/// The scheme is matched case-insensitively.
///
/// # Response
///
/// - Returns 401 Unauthorized with WWW-Authenticate header if token is missing or invalid
/// - Continues to next handler with identity in extensions if token is valid
#[instrument(skip_all, name = "sand.middleware.auth")]
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, SandError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            tracing::debug!(target: "sand.middleware.auth", "Missing Authorization header");
            SandError::InvalidToken("Missing Authorization header".to_string())
        })?;

    let token = bearer_token(auth_header).ok_or_else(|| {
        tracing::debug!(target: "sand.middleware.auth", "Invalid Authorization header format");
        SandError::InvalidToken("Invalid Authorization header format".to_string())
    })?;

    let identity = state.auth.authenticate(token)?;

    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}

/// Split `Bearer <token>`, ignoring the scheme's case.
fn bearer_token(header_value: &str) -> Option<&str> {
    let (scheme, token) = header_value.split_once(' ')?;
    let token = token.trim();

    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token)
    } else {
        None
    }
}
