//! Integration tests for `POST /login`.

use reqwest::StatusCode;
use sand_service::models::TokenResponse;
use sand_test_utils::{TestSandServer, TokenAssertions, TEST_PASSWORD, TEST_USERNAME};

#[tokio::test]
async fn test_login_issues_bearer_token() -> Result<(), anyhow::Error> {
    let server = TestSandServer::spawn().await?;

    let response = server.login(TEST_USERNAME, TEST_PASSWORD).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let body: TokenResponse = response.json().await?;
    assert_eq!(body.token_type, "bearer");

    body.access_token
        .assert_valid_jwt()
        .assert_for_subject(TEST_USERNAME)
        .assert_signed_by(server.key_id())
        .assert_expires_in(30 * 60);

    Ok(())
}

#[tokio::test]
async fn test_login_wrong_password_is_401() -> Result<(), anyhow::Error> {
    let server = TestSandServer::spawn().await?;

    let response = server.login(TEST_USERNAME, "not-the-password").await?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response
            .headers()
            .get("www-authenticate")
            .and_then(|v| v.to_str().ok()),
        Some("Bearer")
    );

    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["detail"], "Incorrect username or password");

    Ok(())
}

#[tokio::test]
async fn test_login_unknown_user_matches_wrong_password() -> Result<(), anyhow::Error> {
    let server = TestSandServer::spawn().await?;

    let unknown = server.login("nobody", TEST_PASSWORD).await?;
    let wrong = server.login(TEST_USERNAME, "nope").await?;

    assert_eq!(unknown.status(), wrong.status());
    let unknown_body: serde_json::Value = unknown.json().await?;
    let wrong_body: serde_json::Value = wrong.json().await?;
    assert_eq!(unknown_body, wrong_body);

    Ok(())
}

#[tokio::test]
async fn test_login_missing_password_is_401() -> Result<(), anyhow::Error> {
    let server = TestSandServer::spawn().await?;

    let response = server
        .client()
        .post(format!("{}/login", server.url()))
        .form(&[("username", TEST_USERNAME)])
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn test_each_login_issues_a_usable_token() -> Result<(), anyhow::Error> {
    let server = TestSandServer::spawn().await?;

    let first = server.login_token().await?;
    let second = server.login_token().await?;

    for token in [first, second] {
        let response = server
            .upload(
                &token,
                &[
                    ("date_receive", "15.03.2024"),
                    ("plant", "A"),
                    ("vendor", "V1"),
                    ("fines", "80"),
                    ("bulk", "20"),
                ],
            )
            .await?;
        assert_eq!(response.status(), StatusCode::OK);
    }

    Ok(())
}
