//! HTTP routes for the sand prediction service.
//!
//! Public routes (`/login`, `/health`, `/ready`, `/metrics`) are merged with
//! the protected `/upload` route, which sits behind `require_auth`.

use crate::config::CorsOrigins;
use crate::handlers;
use crate::middleware::auth::require_auth;
use crate::middleware::http_metrics::http_metrics_middleware;
use crate::services::auth_service::AuthGate;
use crate::services::prediction_service::PredictionService;
use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthGate>,

    pub predictions: PredictionService,

    pub cors_allowed_origins: CorsOrigins,

    pub request_timeout: Duration,
}

/// Build the application routes.
///
/// Layer order, outermost first: HTTP metrics, timeout, CORS, tracing.
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let cors = cors_layer(&state.cors_allowed_origins);
    let request_timeout = state.request_timeout;

    let public_routes = Router::new()
        .route("/login", post(handlers::handle_login))
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .with_state(state.clone());

    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    let protected_routes = Router::new()
        .route("/upload", post(handlers::handle_upload))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state);

    public_routes
        .merge(metrics_routes)
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(middleware::from_fn(http_metrics_middleware))
}

/// Wildcard origins cannot be combined with credentials, so only an explicit
/// origin list enables them.
fn cors_layer(origins: &CorsOrigins) -> CorsLayer {
    match origins {
        CorsOrigins::Any => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
        CorsOrigins::List(list) => {
            let values: Vec<HeaderValue> = list
                .iter()
                .filter_map(|origin| match HeaderValue::from_str(origin) {
                    Ok(value) => Some(value),
                    Err(_) => {
                        tracing::warn!(target: "sand.routes", origin = %origin, "Ignoring invalid CORS origin");
                        None
                    }
                })
                .collect();

            CorsLayer::new()
                .allow_origin(AllowOrigin::list(values))
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
                .allow_credentials(true)
        }
    }
}
