use crate::errors::SandError;
use crate::models::{Identity, PredictionForm, PredictionRequest, PredictionResult};
use crate::observability::hash_for_correlation;
use crate::routes::AppState;
use axum::{
    extract::{rejection::FormRejection, State},
    Extension, Form, Json,
};
use std::sync::Arc;
use tracing::instrument;

/// Handle a prediction request
///
/// POST /upload (form-encoded `date_receive`, `plant`, `vendor`, `fines`, `bulk`)
///
/// Requires a bearer token. Input and inference failures come back as
/// `200 {"error": ...}`.
#[instrument(
    skip_all,
    name = "sand.inference.upload",
    fields(user = %hash_for_correlation(&identity.username))
)]
pub async fn handle_upload(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    form: Result<Form<PredictionForm>, FormRejection>,
) -> Result<Json<PredictionResult>, SandError> {
    let Form(form) = form.map_err(|e| {
        tracing::debug!(target: "sand.inference", error = %e, "Upload form rejected");
        SandError::InvalidInput(
            "request body must be a form with date_receive, plant, vendor, fines and bulk"
                .to_string(),
        )
    })?;

    let request = PredictionRequest::try_from(form)?;

    tracing::info!(
        target: "sand.inference",
        date_receive = %request.date_receive,
        plant = %request.plant,
        vendor = %request.vendor,
        fines = request.fines,
        bulk = request.bulk,
        "Received prediction request"
    );

    let result = state.predictions.predict(request).await?;

    Ok(Json(result))
}
