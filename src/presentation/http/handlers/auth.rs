//! Authentication Handlers

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    Json,
};

use crate::application::dto::{
    LoginRequest, LoginResponse, MessageResponse, RegisterRequest, ResendOtpRequest, UserSummary,
    VerifyOtpRequest,
};
use crate::application::services::AuthError;
use crate::presentation::http::extractors::JsonBody;
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::startup::AppState;

/// Register a new, unverified account
pub async fn register(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    let response = state.auth.register(body).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Confirm an email address with its OTP
pub async fn verify_otp(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<VerifyOtpRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    Ok(Json(state.auth.verify_otp(body).await?))
}

/// Login with username or email
pub async fn login(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    Ok(Json(state.auth.login(body).await?))
}

pub async fn resend_otp(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<ResendOtpRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    Ok(Json(state.auth.resend_otp(body).await?))
}

/// Get current authenticated user
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<UserSummary>, AppError> {
    let user = state
        .auth
        .current_user(auth.user_id)
        .await
        .map_err(|e| match e {
            AuthError::UserNotFound => AppError::NotFound("User not found".into()),
            e => e.into(),
        })?;

    Ok(Json(UserSummary::from(&user)))
}
