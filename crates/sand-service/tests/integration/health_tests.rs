//! Integration tests for health, readiness and metrics endpoints.

use reqwest::StatusCode;
use sand_test_utils::TestSandServer;

#[tokio::test]
async fn test_health_endpoint_returns_ok() -> Result<(), anyhow::Error> {
    let server = TestSandServer::spawn().await?;

    let response = server
        .client()
        .get(format!("{}/health", server.url()))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await?, "OK");

    Ok(())
}

#[tokio::test]
async fn test_ready_endpoint_reports_loaded_collaborators() -> Result<(), anyhow::Error> {
    let server = TestSandServer::spawn().await?;

    let response = server
        .client()
        .get(format!("{}/ready", server.url()))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["status"].as_str(), Some("ready"));
    assert_eq!(body["model"].as_str(), Some("fixed"));
    assert_eq!(body["season_entries"].as_u64(), Some(6));
    assert_eq!(body["region_entries"].as_u64(), Some(2));

    Ok(())
}

#[tokio::test]
async fn test_metrics_endpoint_is_public() -> Result<(), anyhow::Error> {
    let server = TestSandServer::spawn().await?;

    let response = server
        .client()
        .get(format!("{}/metrics", server.url()))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn test_unknown_route_is_404() -> Result<(), anyhow::Error> {
    let server = TestSandServer::spawn().await?;

    let response = server
        .client()
        .get(format!("{}/docs", server.url()))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    Ok(())
}
