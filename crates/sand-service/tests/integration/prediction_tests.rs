//! Integration tests for `POST /upload`.

use reqwest::StatusCode;
use sand_service::errors::GENERIC_PREDICTION_ERROR;
use sand_service::inference::LinearModel;
use sand_service::models::PredictionResult;
use sand_test_utils::{
    EchoPredictor, FailingPredictor, FixedPredictor, PanickingPredictor, TestSandServer,
};
use std::sync::Arc;

fn form<'a>(date: &'a str, vendor: &'a str, fines: &'a str) -> Vec<(&'a str, &'a str)> {
    vec![
        ("date_receive", date),
        ("plant", "A"),
        ("vendor", vendor),
        ("fines", fines),
        ("bulk", "20.0"),
    ]
}

async fn error_message(response: reqwest::Response) -> Result<String, anyhow::Error> {
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await?;
    body["error"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("response has no error field: {}", body))
}

#[tokio::test]
async fn test_upload_golden_case() -> Result<(), anyhow::Error> {
    let server = TestSandServer::spawn().await?;
    let token = server.login_token().await?;

    let response = server
        .upload(&token, &form("15.03.2024", "V1", "80.0"))
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let result: PredictionResult = response.json().await?;
    assert_eq!(
        result,
        PredictionResult {
            sand_predict_value: 50.0,
            total_sand_value: 40.0,
        }
    );

    Ok(())
}

#[tokio::test]
async fn test_upload_rounds_to_two_decimals() -> Result<(), anyhow::Error> {
    let server = TestSandServer::spawn_with_predictor(Arc::new(FixedPredictor(12.3456))).await?;
    let token = server.login_token().await?;

    let response = server
        .upload(&token, &form("01.07.2023", "V2", "33.3"))
        .await?;

    let result: PredictionResult = response.json().await?;
    assert_eq!(result.sand_predict_value, 12.35);
    // 12.3456 * 33.3 / 100 = 4.1110848
    assert_eq!(result.total_sand_value, 4.11);

    Ok(())
}

#[tokio::test]
async fn test_upload_unknown_season_falls_back() -> Result<(), anyhow::Error> {
    let server = TestSandServer::spawn_with_predictor(Arc::new(EchoPredictor)).await?;
    let token = server.login_token().await?;

    // July is not in the fixture season table
    let unknown = server
        .upload(&token, &form("10.07.2024", "V1", "100"))
        .await?;
    let result: PredictionResult = unknown.json().await?;
    assert_eq!(result.sand_predict_value, 70.0);

    let known = server
        .upload(&token, &form("10.03.2024", "V1", "100"))
        .await?;
    let result: PredictionResult = known.json().await?;
    assert_eq!(result.sand_predict_value, 31.0);

    Ok(())
}

#[tokio::test]
async fn test_upload_unknown_vendor_still_predicts() -> Result<(), anyhow::Error> {
    let server = TestSandServer::spawn().await?;
    let token = server.login_token().await?;

    let response = server
        .upload(&token, &form("15.03.2024", "V404", "80"))
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let result: PredictionResult = response.json().await?;
    assert_eq!(result.sand_predict_value, 50.0);

    Ok(())
}

#[tokio::test]
async fn test_upload_invalid_date_returns_error_payload() -> Result<(), anyhow::Error> {
    let server = TestSandServer::spawn().await?;
    let token = server.login_token().await?;

    for date in ["2024-03-15", "31.02.2024", "15.13.2024", ""] {
        let response = server.upload(&token, &form(date, "V1", "80")).await?;
        let message = error_message(response).await?;
        assert!(message.contains("date_receive"), "unexpected message: {message}");
    }

    Ok(())
}

#[tokio::test]
async fn test_upload_non_numeric_fines_returns_error_payload() -> Result<(), anyhow::Error> {
    let server = TestSandServer::spawn().await?;
    let token = server.login_token().await?;

    for fines in ["lots", "NaN", "inf"] {
        let response = server
            .upload(&token, &form("15.03.2024", "V1", fines))
            .await?;
        assert_eq!(error_message(response).await?, "fines must be a number");
    }

    Ok(())
}

#[tokio::test]
async fn test_upload_missing_field_returns_error_payload() -> Result<(), anyhow::Error> {
    let server = TestSandServer::spawn().await?;
    let token = server.login_token().await?;

    let response = server
        .upload(
            &token,
            &[
                ("date_receive", "15.03.2024"),
                ("plant", "A"),
                ("fines", "80"),
                ("bulk", "20"),
            ],
        )
        .await?;

    assert_eq!(error_message(response).await?, "missing field: vendor");

    Ok(())
}

#[tokio::test]
async fn test_upload_model_failure_is_generic() -> Result<(), anyhow::Error> {
    let server = TestSandServer::spawn_with_predictor(Arc::new(FailingPredictor(
        "coefficient table missing plant Z".to_string(),
    )))
    .await?;
    let token = server.login_token().await?;

    let response = server
        .upload(&token, &form("15.03.2024", "V1", "80"))
        .await?;

    let message = error_message(response).await?;
    assert_eq!(message, GENERIC_PREDICTION_ERROR);
    assert!(!message.contains("plant Z"));

    Ok(())
}

#[tokio::test]
async fn test_upload_model_panic_is_contained() -> Result<(), anyhow::Error> {
    let server = TestSandServer::spawn_with_predictor(Arc::new(PanickingPredictor)).await?;
    let token = server.login_token().await?;

    for _ in 0..3 {
        let response = server
            .upload(&token, &form("15.03.2024", "V1", "80"))
            .await?;
        assert_eq!(error_message(response).await?, GENERIC_PREDICTION_ERROR);
    }

    let health = server
        .client()
        .get(format!("{}/health", server.url()))
        .send()
        .await?;
    assert_eq!(health.status(), StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn test_upload_overflowing_total_returns_error_payload() -> Result<(), anyhow::Error> {
    let server = TestSandServer::spawn().await?;
    let token = server.login_token().await?;

    let response = server
        .upload(&token, &form("15.03.2024", "V1", "1e307"))
        .await?;

    assert_eq!(error_message(response).await?, GENERIC_PREDICTION_ERROR);

    Ok(())
}

#[tokio::test]
async fn test_upload_repeated_request_is_deterministic() -> Result<(), anyhow::Error> {
    let model = LinearModel::from_json_str(include_str!("../../data/model.json"))?;
    let server = TestSandServer::spawn_with_predictor(Arc::new(model)).await?;
    let token = server.login_token().await?;

    let mut results = Vec::new();
    for _ in 0..4 {
        let response = server
            .upload(&token, &form("15.03.2024", "V2", "42.5"))
            .await?;
        assert_eq!(response.status(), StatusCode::OK);
        results.push(response.json::<PredictionResult>().await?);
    }

    let first = results.first().copied();
    assert!(first.is_some());
    assert!(results.iter().all(|r| Some(*r) == first));

    Ok(())
}
