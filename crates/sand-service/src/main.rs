use metrics_exporter_prometheus::PrometheusHandle;
use sand_service::config::Config;
use sand_service::crypto;
use sand_service::inference::LinearModel;
use sand_service::masterdata::LookupTables;
use sand_service::observability::metrics::init_metrics_recorder;
use sand_service::routes::{self, AppState};
use sand_service::services::auth_service::{AuthConfig, AuthGate};
use sand_service::services::prediction_service::PredictionService;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration first so the log format is known
    let config = Config::from_env();

    let observability = config
        .as_ref()
        .map(|c| c.observability.clone())
        .unwrap_or_default();
    let json_logs = observability.json_logs;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_new(&observability.log_filter)
                .unwrap_or_else(|_| common::config::DEFAULT_LOG_FILTER.into()),
        )
        .with(json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json_logs).then(|| tracing_subscriber::fmt::layer()))
        .init();

    info!("Starting sand prediction service");

    let config = config.map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        bind_address = %config.bind_address,
        model_path = %config.model_path.display(),
        masterdata_path = %config.masterdata_path.display(),
        "Configuration loaded successfully"
    );

    // Initialize Prometheus metrics recorder before anything records
    let metrics_handle: PrometheusHandle = init_metrics_recorder().map_err(|e| {
        error!("Failed to initialize metrics recorder: {}", e);
        e
    })?;

    let tables = LookupTables::from_path(&config.masterdata_path).map_err(|e| {
        error!("Failed to load lookup tables: {}", e);
        e
    })?;

    let model = LinearModel::from_path(&config.model_path).map_err(|e| {
        error!("Failed to load model: {}", e);
        e
    })?;

    let auth_config = AuthConfig::from_config(&config).map_err(|e| {
        error!("Failed to build auth configuration: {}", e);
        e
    })?;

    let signing_key = crypto::generate_signing_key().map_err(|e| {
        error!("Failed to generate signing key: {}", e);
        e
    })?;

    let auth = AuthGate::new(auth_config, signing_key)?;

    let predictions = PredictionService::new(
        Arc::new(model),
        Arc::new(tables),
        config.max_concurrent_inferences,
    );

    let state = Arc::new(AppState {
        auth: Arc::new(auth),
        predictions,
        cors_allowed_origins: config.cors_allowed_origins.clone(),
        request_timeout: Duration::from_secs(config.request_timeout_seconds),
    });

    let app = routes::build_routes(state, metrics_handle);

    let addr: SocketAddr = config.bind_address.parse().map_err(|e| {
        error!("Invalid bind address: {}", e);
        e
    })?;

    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Sand prediction service listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Sand prediction service shutdown complete");

    Ok(())
}

/// Resolve on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = wait_for_signal("SIGINT", signal::ctrl_c());

    #[cfg(unix)]
    let terminate = wait_for_signal("SIGTERM", async {
        let mut stream = signal::unix::signal(signal::unix::SignalKind::terminate())?;
        stream.recv().await;
        Ok(())
    });

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

/// Resolve when `listener` delivers the signal.
///
/// A listener that cannot be installed never resolves, so it cannot trigger
/// shutdown on its own.
async fn wait_for_signal<F>(name: &str, listener: F)
where
    F: std::future::Future<Output = std::io::Result<()>>,
{
    match listener.await {
        Ok(()) => info!("Received {}, starting graceful shutdown...", name),
        Err(e) => {
            error!("Failed to listen for {}: {}", name, e);
            std::future::pending::<()>().await;
        }
    }
}
