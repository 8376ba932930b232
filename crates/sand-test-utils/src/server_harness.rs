//! Test server harness for E2E testing
//!
//! Provides TestSandServer for spawning real sand-service instances in tests.

use crate::fixtures::{
    test_auth_gate, test_lookup_tables, FixedPredictor, TEST_PASSWORD, TEST_USERNAME,
};
use metrics_exporter_prometheus::PrometheusBuilder;
use sand_service::config::CorsOrigins;
use sand_service::inference::Predictor;
use sand_service::models::TokenResponse;
use sand_service::routes::{self, AppState};
use sand_service::services::prediction_service::PredictionService;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Seed of the fixture key the test server signs with.
///
/// Tokens built with `TestTokenBuilder::sign_with(&test_signing_key(TEST_SERVER_KEY_SEED)?)`
/// are accepted by the server.
pub const TEST_SERVER_KEY_SEED: u8 = 1;

/// Prediction returned by the default test server's model.
pub const TEST_PREDICTION: f64 = 50.0;

/// Test harness for spawning the sand service in E2E tests
///
/// # Example
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_prediction_e2e() -> Result<(), anyhow::Error> {
///     let server = TestSandServer::spawn().await?;
///     let token = server.login_token().await?;
///
///     let response = server
///         .upload(&token, &[("date_receive", "15.03.2024"), ("plant", "A")])
///         .await?;
///
///     assert_eq!(response.status(), 200);
///     Ok(())
/// }
/// ```
pub struct TestSandServer {
    addr: SocketAddr,
    key_id: String,
    client: reqwest::Client,
    handle: JoinHandle<()>,
}

impl TestSandServer {
    /// Spawn a server whose model always predicts [`TEST_PREDICTION`].
    pub async fn spawn() -> Result<Self, anyhow::Error> {
        Self::spawn_with_predictor(Arc::new(FixedPredictor(TEST_PREDICTION))).await
    }

    /// Spawn a server around the given predictor.
    ///
    /// The server will:
    /// - Bind to a random available port (127.0.0.1:0)
    /// - Accept [`TEST_USERNAME`] / [`TEST_PASSWORD`]
    /// - Sign tokens with the fixture key for [`TEST_SERVER_KEY_SEED`]
    /// - Use the fixture lookup tables
    pub async fn spawn_with_predictor(predictor: Arc<dyn Predictor>) -> Result<Self, anyhow::Error> {
        let auth = test_auth_gate(TEST_SERVER_KEY_SEED)
            .map_err(|e| anyhow::anyhow!("Failed to build auth gate: {}", e))?;
        let key_id = auth.key_id().to_string();

        let state = Arc::new(AppState {
            auth: Arc::new(auth),
            predictions: PredictionService::new(predictor, Arc::new(test_lookup_tables()), 2),
            cors_allowed_origins: CorsOrigins::Any,
            request_timeout: Duration::from_secs(10),
        });

        // Standalone recorder; the global one can only be installed once per process
        let metrics_handle = PrometheusBuilder::new().build_recorder().handle();

        let app = routes::build_routes(state, metrics_handle);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            key_id,
            client: reqwest::Client::new(),
            handle,
        })
    }

    /// Get the base URL of the test server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get the socket address
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Key id stamped into tokens this server issues
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// POST /login with the given credentials
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<reqwest::Response, anyhow::Error> {
        let response = self
            .client
            .post(format!("{}/login", self.url()))
            .form(&[("username", username), ("password", password)])
            .send()
            .await?;
        Ok(response)
    }

    /// Log in with the fixture credential and return the access token
    pub async fn login_token(&self) -> Result<String, anyhow::Error> {
        let response = self.login(TEST_USERNAME, TEST_PASSWORD).await?;
        if !response.status().is_success() {
            anyhow::bail!("Login failed with status {}", response.status());
        }
        let body: TokenResponse = response.json().await?;
        Ok(body.access_token)
    }

    /// POST /upload with a bearer token and form fields
    pub async fn upload(
        &self,
        token: &str,
        fields: &[(&str, &str)],
    ) -> Result<reqwest::Response, anyhow::Error> {
        let response = self
            .client
            .post(format!("{}/upload", self.url()))
            .bearer_auth(token)
            .form(fields)
            .send()
            .await?;
        Ok(response)
    }
}

impl Drop for TestSandServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
