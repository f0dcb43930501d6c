//! Authentication API Tests

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;

use direct_chat::application::services::decode_token;
use direct_chat::domain::UserRepository;

use crate::common::{body_json, expired, unique_email, unique_username, TestApp, JWT_SECRET};

#[tokio::test]
async fn test_register_verify_login_flow() {
    let app = TestApp::new().await;
    let username = unique_username();
    let email = unique_email();

    let response = app
        .post_json(
            "/auth/register",
            &json!({ "username": username, "email": email.to_uppercase(), "password": "ValidPassword123" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    // Stored and mailed to the normalized address
    let otp = app.mailer.last_code_for(&email).expect("otp mailed");
    assert_eq!(otp.len(), 6);

    let response = app
        .post_json("/auth/login", &json!({ "identifier": username, "password": "ValidPassword123" }))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["message"], "Please verify your email first");

    let response = app
        .post_json("/auth/verify-otp", &json!({ "email": email, "otp": otp }))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["message"], "Email verified successfully");

    let response = app
        .post_json("/auth/login", &json!({ "identifier": email, "password": "ValidPassword123" }))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Login successful");
    assert_eq!(body["user"]["username"], username.as_str());

    let claims = decode_token(JWT_SECRET, body["token"].as_str().unwrap()).unwrap();
    assert_eq!(claims.username, username);
    assert_eq!(claims.email, email);

    let response = app
        .get_auth("/auth/me", body["token"].as_str().unwrap())
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["username"], username.as_str());
}

#[tokio::test]
async fn test_register_with_invalid_email_fails() {
    let app = TestApp::new().await;

    let response = app
        .post_json(
            "/auth/register",
            &json!({ "username": "alice", "email": "not-an-email", "password": "ValidPassword123" }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["code"], 10007);
    assert_eq!(app.mailer.sent_count(), 0);
}

#[tokio::test]
async fn test_register_with_short_password_fails() {
    let app = TestApp::new().await;

    let response = app
        .post_json(
            "/auth/register",
            &json!({ "username": "alice", "email": unique_email(), "password": "short" }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_register_username_too_short_once_trimmed() {
    let app = TestApp::new().await;

    let response = app
        .post_json(
            "/auth/register",
            &json!({ "username": "  a  ", "email": unique_email(), "password": "ValidPassword123" }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(app.users.get("a").is_none());
}

#[tokio::test]
async fn test_register_normalizes_padded_email() {
    let app = TestApp::new().await;
    let username = unique_username();
    let email = unique_email();

    let response = app
        .post_json(
            "/auth/register",
            &json!({
                "username": username,
                "email": format!("  {}  ", email.to_uppercase()),
                "password": "ValidPassword123"
            }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(app.users.get(&username).unwrap().email, email);
    assert!(app.mailer.last_code_for(&email).is_some());
}

#[tokio::test]
async fn test_register_rejects_underscore_username() {
    let app = TestApp::new().await;

    let response = app
        .post_json(
            "/auth/register",
            &json!({ "username": "alice_bob", "email": unique_email(), "password": "ValidPassword123" }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_register_malformed_body_uses_error_envelope() {
    let app = TestApp::new().await;

    let response = app
        .post_json("/auth/register", &json!({ "username": "alice" }))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["code"], 10002);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_register_duplicate_of_verified_account() {
    let app = TestApp::new().await;
    let existing = app.users.seed("carol");

    let response = app
        .post_json(
            "/auth/register",
            &json!({ "username": "carol2", "email": existing.email, "password": "ValidPassword123" }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["message"],
        "Username or email already exists"
    );
}

#[tokio::test]
async fn test_register_succeeds_when_mail_fails() {
    let app = TestApp::new().await;
    app.mailer.set_failing(true);
    let username = unique_username();

    let response = app
        .post_json(
            "/auth/register",
            &json!({ "username": username, "email": unique_email(), "password": "ValidPassword123" }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    assert!(app.users.get(&username).is_some());
}

#[tokio::test]
async fn test_resend_otp_reports_mail_failure() {
    let app = TestApp::new().await;
    let email = unique_email();
    app.post_json(
        "/auth/register",
        &json!({ "username": unique_username(), "email": email, "password": "ValidPassword123" }),
    )
    .await;
    app.mailer.set_failing(true);

    let response = app
        .post_json("/auth/resend-otp", &json!({ "email": email }))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["message"],
        "Failed to send OTP email. Please try resend OTP."
    );
}

#[tokio::test]
async fn test_resend_otp_replaces_code() {
    let app = TestApp::new().await;
    let email = unique_email();
    app.post_json(
        "/auth/register",
        &json!({ "username": unique_username(), "email": email, "password": "ValidPassword123" }),
    )
    .await;

    let response = app
        .post_json("/auth/resend-otp", &json!({ "email": email }))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.mailer.sent_count(), 2);
}

#[tokio::test]
async fn test_verify_otp_unknown_user() {
    let app = TestApp::new().await;

    let response = app
        .post_json(
            "/auth/verify-otp",
            &json!({ "email": "nobody@example.com", "otp": "123456" }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["message"], "User not found");
}

#[tokio::test]
async fn test_verify_otp_expired() {
    let app = TestApp::new().await;
    let username = unique_username();
    let email = unique_email();
    app.post_json(
        "/auth/register",
        &json!({ "username": username, "email": email, "password": "ValidPassword123" }),
    )
    .await;
    let otp = app.mailer.last_code_for(&email).unwrap();

    let user = app.users.get(&username).unwrap();
    let otp_hash = user.otp_hash.clone().unwrap();
    app.users.set_otp(user.id, &otp_hash, expired()).await.unwrap();

    let response = app
        .post_json("/auth/verify-otp", &json!({ "email": email, "otp": otp }))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["message"], "OTP has expired");
}

#[tokio::test]
async fn test_login_unknown_identifier() {
    let app = TestApp::new().await;

    let response = app
        .post_json("/auth/login", &json!({ "identifier": "ghost", "password": "whatever1" }))
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["message"], "Invalid credentials");
}

#[tokio::test]
async fn test_me_requires_token() {
    let app = TestApp::new().await;

    let response = app.get("/auth/me").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app.get_auth("/auth/me", "not-a-jwt").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
