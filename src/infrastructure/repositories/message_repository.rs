//! Message Repository Implementation
//!
//! PostgreSQL implementation of append-only message storage and ordered
//! history replay.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{HistoryEntry, Message, MessageRepository};
use crate::shared::error::AppError;

/// PostgreSQL message repository implementation.
pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    /// Creates a new PgMessageRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct MessageRow {
    id: i64,
    room_id: i64,
    sender_id: i64,
    text: String,
    created_at: DateTime<Utc>,
}

impl MessageRow {
    fn into_message(self) -> Message {
        Message {
            id: self.id,
            room_id: self.room_id,
            sender_id: self.sender_id,
            text: self.text,
            created_at: self.created_at,
        }
    }
}

/// History row: a message joined with its sender's username.
#[derive(Debug, sqlx::FromRow)]
struct HistoryRow {
    id: i64,
    room_id: i64,
    sender_id: i64,
    text: String,
    created_at: DateTime<Utc>,
    sender_username: String,
}

impl HistoryRow {
    fn into_entry(self) -> HistoryEntry {
        HistoryEntry {
            message: Message {
                id: self.id,
                room_id: self.room_id,
                sender_id: self.sender_id,
                text: self.text,
                created_at: self.created_at,
            },
            sender_username: self.sender_username,
        }
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    async fn create(&self, message: &Message) -> Result<Message, AppError> {
        let row = sqlx::query_as::<_, MessageRow>(
            r#"
            INSERT INTO messages (id, room_id, sender_id, text)
            VALUES ($1, $2, $3, $4)
            RETURNING id, room_id, sender_id, text, created_at
            "#,
        )
        .bind(message.id)
        .bind(message.room_id)
        .bind(message.sender_id)
        .bind(&message.text)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_message())
    }

    /// Sender names are resolved in the same query instead of one lookup per row.
    async fn history(&self, room_id: i64) -> Result<Vec<HistoryEntry>, AppError> {
        let rows = sqlx::query_as::<_, HistoryRow>(
            r#"
            SELECT m.id, m.room_id, m.sender_id, m.text, m.created_at,
                   u.username AS sender_username
            FROM messages m
            JOIN users u ON u.id = m.sender_id
            WHERE m.room_id = $1
            ORDER BY m.created_at ASC, m.id ASC
            "#,
        )
        .bind(room_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(HistoryRow::into_entry).collect())
    }
}
