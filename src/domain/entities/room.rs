//! Room entity and repository trait.
//!
//! Maps to the `rooms` table. A room is one unordered pair of distinct
//! participants, created lazily and never modified afterwards.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::RoomKey;
use crate::shared::error::AppError;

/// Represents a private conversation between two users.
///
/// Maps to the `rooms` table:
/// - id: BIGINT PRIMARY KEY (Snowflake ID)
/// - room_key: VARCHAR(80) NOT NULL UNIQUE
/// - participant_a: VARCHAR(32) NOT NULL (lexicographically smaller)
/// - participant_b: VARCHAR(32) NOT NULL
/// - created_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: i64,
    pub key: RoomKey,
    pub participant_a: String,
    pub participant_b: String,
    pub created_at: DateTime<Utc>,
}

impl Room {
    /// The participant that is not `username`.
    pub fn peer_of(&self, username: &str) -> Option<&str> {
        if self.participant_a == username {
            Some(&self.participant_b)
        } else if self.participant_b == username {
            Some(&self.participant_a)
        } else {
            None
        }
    }
}

/// Repository trait for Room data access operations.
#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// Find a room by its canonical key.
    async fn find_by_key(&self, key: &RoomKey) -> Result<Option<Room>, AppError>;

    /// Insert a room. A duplicate key yields `AppError::Conflict`.
    async fn create(&self, room: &Room) -> Result<Room, AppError>;
}
