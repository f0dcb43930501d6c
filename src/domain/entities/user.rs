//! User entity and repository trait.
//!
//! Maps to the `users` table in the database schema.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// Represents a user account in the chat system.
///
/// Maps to the `users` table:
/// - id: BIGINT PRIMARY KEY (Snowflake ID)
/// - username: VARCHAR(32) NOT NULL UNIQUE
/// - email: VARCHAR(255) NOT NULL UNIQUE
/// - password_hash: VARCHAR(255) NOT NULL
/// - is_verified: BOOLEAN NOT NULL DEFAULT FALSE
/// - otp_hash: VARCHAR(255) NULL
/// - otp_expires_at: TIMESTAMPTZ NULL
/// - created_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// - updated_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Snowflake ID (primary key)
    pub id: i64,

    /// Username (unique, used as the chat identity)
    pub username: String,

    /// Email address (unique, lowercased)
    pub email: String,

    /// Argon2 password hash
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Whether the email address has been confirmed with an OTP
    pub is_verified: bool,

    /// Argon2 hash of the pending OTP, cleared once used
    #[serde(skip_serializing)]
    pub otp_hash: Option<String>,

    /// Expiry of the pending OTP
    #[serde(skip_serializing)]
    pub otp_expires_at: Option<DateTime<Utc>>,

    /// Account creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Build an unverified account with a pending OTP.
    pub fn new_unverified(
        id: i64,
        username: String,
        email: String,
        password_hash: String,
        otp_hash: String,
        otp_expires_at: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            username,
            email,
            password_hash,
            is_verified: false,
            otp_hash: Some(otp_hash),
            otp_expires_at: Some(otp_expires_at),
            created_at: now,
            updated_at: now,
        }
    }

    /// True when an OTP is pending and has not yet expired at `now`.
    pub fn has_live_otp(&self, now: DateTime<Utc>) -> bool {
        matches!((&self.otp_hash, self.otp_expires_at), (Some(_), Some(exp)) if exp >= now)
    }
}

/// Repository trait for User data access operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by their Snowflake ID.
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError>;

    /// Find a user by their (normalized) email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Find a user by username.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError>;

    /// Find a user whose username or email equals `identifier`.
    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<User>, AppError>;

    /// Create a new user. Duplicate username/email yields `AppError::Conflict`.
    async fn create(&self, user: &User) -> Result<User, AppError>;

    /// Replace the pending OTP hash and expiry.
    async fn set_otp(
        &self,
        id: i64,
        otp_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError>;

    /// Mark the account verified and clear any pending OTP.
    async fn mark_verified(&self, id: i64) -> Result<(), AppError>;

    /// All users ordered by creation time ascending.
    async fn list(&self) -> Result<Vec<User>, AppError>;
}
