//! Request DTOs
//!
//! Data structures for HTTP request bodies and inbound socket payloads.
//! Everything is validated before it reaches a service.

use serde::Deserialize;
use validator::Validate;

/// Registration request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 2, max = 32, message = "Username must be 2-32 characters"))]
    pub username: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

/// OTP verification request
#[derive(Debug, Deserialize, Validate)]
pub struct VerifyOtpRequest {
    #[validate(length(min = 1, message = "Email and OTP are required"))]
    pub email: String,

    #[validate(length(min = 1, message = "Email and OTP are required"))]
    pub otp: String,
}

/// Login request; `identifier` is a username or an email address
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Identifier is required"))]
    pub identifier: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Resend OTP request
#[derive(Debug, Deserialize, Validate)]
pub struct ResendOtpRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

/// `join-room` socket payload
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct JoinRoomRequest {
    #[validate(length(min = 1, max = 32, message = "sender is required"))]
    pub sender: String,

    #[validate(length(min = 1, max = 32, message = "receiver is required"))]
    pub receiver: String,
}

/// `send-message` socket payload
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct SendMessageRequest {
    #[validate(length(min = 1, max = 32, message = "sender is required"))]
    pub sender: String,

    #[validate(length(min = 1, max = 32, message = "receiver is required"))]
    pub receiver: String,

    // Keep in step with MAX_MESSAGE_LENGTH.
    #[validate(length(min = 1, max = 2000, message = "Message must be 1-2000 characters"))]
    pub text: String,
}
