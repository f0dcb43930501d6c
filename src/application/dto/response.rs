//! Response DTOs
//!
//! Data structures for API response bodies. Field names are camelCase on
//! the wire.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::User;

/// Plain `{ "message": ... }` acknowledgement
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Public identity of the authenticated user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    pub id: String,
    pub username: String,
    pub email: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            username: user.username.clone(),
            email: user.email.clone(),
        }
    }
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub user: UserSummary,
    pub token: String,
}

/// One entry of the user directory
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListItem {
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserListItem {
    fn from(user: User) -> Self {
        Self {
            username: user.username,
            email: user.email,
            created_at: user.created_at,
        }
    }
}
