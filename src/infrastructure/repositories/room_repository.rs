//! Room Repository Implementation
//!
//! PostgreSQL implementation of the RoomRepository trait. The unique index on
//! `rooms.room_key` is what arbitrates concurrent first joins.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{Room, RoomKey, RoomRepository};
use crate::shared::error::AppError;

#[derive(Debug, sqlx::FromRow)]
struct RoomRow {
    id: i64,
    room_key: String,
    participant_a: String,
    participant_b: String,
    created_at: DateTime<Utc>,
}

impl RoomRow {
    fn into_room(self) -> Room {
        Room {
            id: self.id,
            key: RoomKey::from_stored(self.room_key),
            participant_a: self.participant_a,
            participant_b: self.participant_b,
            created_at: self.created_at,
        }
    }
}

/// PostgreSQL room repository implementation.
#[derive(Clone)]
pub struct PgRoomRepository {
    pool: PgPool,
}

impl PgRoomRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoomRepository for PgRoomRepository {
    async fn find_by_key(&self, key: &RoomKey) -> Result<Option<Room>, AppError> {
        let row = sqlx::query_as::<_, RoomRow>(
            r#"
            SELECT id, room_key, participant_a, participant_b, created_at
            FROM rooms
            WHERE room_key = $1
            "#,
        )
        .bind(key.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(RoomRow::into_room))
    }

    async fn create(&self, room: &Room) -> Result<Room, AppError> {
        let row = sqlx::query_as::<_, RoomRow>(
            r#"
            INSERT INTO rooms (id, room_key, participant_a, participant_b)
            VALUES ($1, $2, $3, $4)
            RETURNING id, room_key, participant_a, participant_b, created_at
            "#,
        )
        .bind(room.id)
        .bind(room.key.as_str())
        .bind(&room.participant_a)
        .bind(&room.participant_b)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(format!("Room {} already exists", room.key))
            }
            _ => AppError::Database(e),
        })?;

        Ok(row.into_room())
    }
}
