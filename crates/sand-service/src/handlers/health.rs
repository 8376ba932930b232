//! Health check handlers.
//!
//! - `/health`: Liveness probe - returns OK if the process is running
//! - `/ready`: Readiness probe - reports the loaded model and lookup tables

use crate::models::ReadinessResponse;
use crate::routes::AppState;
use axum::extract::State;
use axum::Json;
use std::sync::Arc;

/// Liveness probe handler.
pub async fn health_check() -> &'static str {
    "OK"
}

/// Readiness probe handler.
///
/// The model and lookup tables are loaded before the listener binds, so a
/// running server is always ready; the body describes what was loaded.
#[tracing::instrument(skip_all, name = "sand.health.readiness")]
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> Json<ReadinessResponse> {
    let tables = state.predictions.tables();

    Json(ReadinessResponse {
        status: "ready",
        model: state.predictions.model_kind(),
        season_entries: tables.season_entries(),
        region_entries: tables.region_entries(),
    })
}
