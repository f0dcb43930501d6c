//! WebSocket Upgrade Tests

use axum::http::StatusCode;

use crate::common::TestApp;

#[tokio::test]
async fn test_ws_without_token_is_unauthorized() {
    let app = TestApp::new().await;

    let response = app.get("/ws").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_ws_with_invalid_token_is_unauthorized() {
    let app = TestApp::new().await;

    let response = app.get("/ws?token=garbage").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_ws_with_valid_token_requires_upgrade() {
    let app = TestApp::new().await;
    let token = app
        .signed_up_token("dave", "dave@example.com", "ValidPassword123")
        .await;

    // Authentication passes; a plain GET is not a WebSocket handshake
    let response = app.get(&format!("/ws?token={}", token)).await;

    assert!(response.status().is_client_error());
    assert_ne!(response.status(), StatusCode::UNAUTHORIZED);
}
