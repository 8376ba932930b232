use crate::errors::SandError;
use crate::models::{LoginForm, TokenResponse};
use crate::routes::AppState;
use axum::{
    extract::{rejection::FormRejection, State},
    Form, Json,
};
use std::sync::Arc;
use tracing::instrument;

/// Handle a login
///
/// POST /login (form-encoded `username`, `password`)
///
/// Any malformed body is treated as bad credentials.
#[instrument(skip_all, name = "sand.auth.login_handler")]
pub async fn handle_login(
    State(state): State<Arc<AppState>>,
    form: Result<Form<LoginForm>, FormRejection>,
) -> Result<Json<TokenResponse>, SandError> {
    let Form(form) = form.map_err(|e| {
        tracing::debug!(target: "sand.auth", error = %e, "Login form rejected");
        SandError::InvalidCredentials
    })?;

    let auth = Arc::clone(&state.auth);
    let token = tokio::task::spawn_blocking(move || auth.login(&form.username, &form.password))
        .await
        .map_err(|e| SandError::Crypto(format!("login task failed: {}", e)))??;

    Ok(Json(token))
}
