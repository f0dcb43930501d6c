//! Message entity and repository trait.
//!
//! Maps to the `messages` table. Messages are append-only.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// Maximum message length in characters.
pub const MAX_MESSAGE_LENGTH: usize = 2000;

/// A single chat utterance.
///
/// Maps to the `messages` table:
/// - id: BIGINT PRIMARY KEY (Snowflake ID)
/// - room_id: BIGINT NOT NULL REFERENCES rooms(id)
/// - sender_id: BIGINT NOT NULL REFERENCES users(id)
/// - text: TEXT NOT NULL
/// - created_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub room_id: i64,
    pub sender_id: i64,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// A stored message joined with its sender's username, as replayed in history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub message: Message,
    pub sender_username: String,
}

/// Repository trait for Message data access operations.
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Append a message. The id is pre-generated; `created_at` is assigned
    /// by the store and returned.
    async fn create(&self, message: &Message) -> Result<Message, AppError>;

    /// Every message of a room ordered by `created_at`, then `id`, ascending.
    async fn history(&self, room_id: i64) -> Result<Vec<HistoryEntry>, AppError>;
}
