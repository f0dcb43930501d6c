//! Room Service
//!
//! Resolves the single room shared by two participants, creating it on
//! first contact.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::{InvalidParticipants, Room, RoomKey, RoomRepository};
use crate::infrastructure::metrics;
use crate::shared::error::AppError;
use crate::shared::snowflake::SnowflakeGenerator;

/// Room service trait for dependency injection
#[async_trait]
pub trait RoomService: Send + Sync {
    /// Get or create the room for the unordered pair `{a, b}`.
    async fn resolve(&self, a: &str, b: &str) -> Result<Room, RoomError>;
}

/// Room resolution errors
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    #[error("Invalid participants: {0}")]
    InvalidParticipants(#[from] InvalidParticipants),

    #[error(transparent)]
    Store(#[from] AppError),
}

/// RoomService implementation
pub struct RoomServiceImpl<R>
where
    R: RoomRepository + ?Sized,
{
    room_repo: Arc<R>,
    id_generator: Arc<SnowflakeGenerator>,
}

impl<R> RoomServiceImpl<R>
where
    R: RoomRepository + ?Sized,
{
    pub fn new(room_repo: Arc<R>, id_generator: Arc<SnowflakeGenerator>) -> Self {
        Self {
            room_repo,
            id_generator,
        }
    }
}

#[async_trait]
impl<R> RoomService for RoomServiceImpl<R>
where
    R: RoomRepository + ?Sized + 'static,
{
    async fn resolve(&self, a: &str, b: &str) -> Result<Room, RoomError> {
        let (key, [first, second]) = RoomKey::derive(a, b)?;

        if let Some(room) = self.room_repo.find_by_key(&key).await? {
            return Ok(room);
        }

        let candidate = Room {
            id: self.id_generator.generate(),
            key: key.clone(),
            participant_a: first.to_string(),
            participant_b: second.to_string(),
            created_at: Utc::now(),
        };

        match self.room_repo.create(&candidate).await {
            Ok(room) => {
                metrics::ROOMS_CREATED_TOTAL.inc();
                tracing::debug!(room_key = %room.key, "Room created");
                Ok(room)
            }
            // Another first join won the insert; its row is authoritative.
            Err(AppError::Conflict(_)) => {
                tracing::debug!(room_key = %key, "Room created concurrently, re-reading");
                self.room_repo.find_by_key(&key).await?.ok_or_else(|| {
                    RoomError::Store(AppError::Internal(format!(
                        "Room {} reported as existing but could not be read",
                        key
                    )))
                })
            }
            Err(e) => Err(e.into()),
        }
    }
}
