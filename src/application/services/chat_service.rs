//! Chat Service
//!
//! Business rules behind the two socket events: opening a room with a peer
//! (and replaying its history) and sending a message into it. Transport
//! concerns such as subscriptions and fan-out live in the gateway.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::room_service::{RoomError, RoomService};
use crate::application::dto::{JoinRoomRequest, SendMessageRequest};
use crate::domain::{
    InvalidParticipants, Message, MessageRepository, Room, RoomKey, User, UserRepository,
    MAX_MESSAGE_LENGTH,
};
use crate::infrastructure::metrics;
use crate::shared::error::AppError;
use crate::shared::snowflake::SnowflakeGenerator;
use crate::shared::validation::validation_error;

/// A message as seen by clients, both in history and live broadcasts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageDto {
    pub sender: String,
    pub receiver: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Chat errors
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("{0}")]
    InvalidParticipants(#[from] InvalidParticipants),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Store(AppError),
}

impl ChatError {
    /// Message safe to send back over the socket.
    pub fn client_message(&self) -> String {
        match self {
            ChatError::Store(e) => e.public_message(),
            other => other.to_string(),
        }
    }
}

impl From<RoomError> for ChatError {
    fn from(err: RoomError) -> Self {
        match err {
            RoomError::InvalidParticipants(e) => ChatError::InvalidParticipants(e),
            RoomError::Store(e) => ChatError::Store(e),
        }
    }
}

impl From<AppError> for ChatError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::Validation(msg) => ChatError::Validation(msg),
            other => ChatError::Store(other),
        }
    }
}

/// Chat service trait for dependency injection
#[async_trait]
pub trait ChatService: Send + Sync {
    /// Validate a join on behalf of `identity` and resolve the room.
    async fn open_room(&self, identity: &str, request: &JoinRoomRequest)
        -> Result<Room, ChatError>;

    /// Full history of `room`, oldest first.
    async fn history(&self, room: &Room) -> Result<Vec<ChatMessageDto>, ChatError>;

    /// Validate, resolve the room and persist a message sent by `identity`.
    async fn send(
        &self,
        identity: &str,
        request: &SendMessageRequest,
    ) -> Result<(Room, ChatMessageDto), ChatError>;
}

/// ChatService implementation
pub struct ChatServiceImpl<U, M>
where
    U: UserRepository + ?Sized,
    M: MessageRepository + ?Sized,
{
    user_repo: Arc<U>,
    message_repo: Arc<M>,
    rooms: Arc<dyn RoomService>,
    id_generator: Arc<SnowflakeGenerator>,
}

impl<U, M> ChatServiceImpl<U, M>
where
    U: UserRepository + ?Sized,
    M: MessageRepository + ?Sized,
{
    pub fn new(
        user_repo: Arc<U>,
        message_repo: Arc<M>,
        rooms: Arc<dyn RoomService>,
        id_generator: Arc<SnowflakeGenerator>,
    ) -> Self {
        Self {
            user_repo,
            message_repo,
            rooms,
            id_generator,
        }
    }

    /// The payload sender must be the identity bound to the connection.
    fn ensure_identity(identity: &str, sender: &str) -> Result<(), ChatError> {
        if identity != sender {
            return Err(ChatError::Forbidden(
                "Sender does not match the authenticated user".into(),
            ));
        }
        Ok(())
    }

    async fn require_user(&self, username: &str, role: &str) -> Result<User, ChatError> {
        self.user_repo
            .find_by_username(username)
            .await?
            .ok_or_else(|| ChatError::NotFound(format!("{} user not found", role)))
    }
}

#[async_trait]
impl<U, M> ChatService for ChatServiceImpl<U, M>
where
    U: UserRepository + ?Sized + 'static,
    M: MessageRepository + ?Sized + 'static,
{
    async fn open_room(
        &self,
        identity: &str,
        request: &JoinRoomRequest,
    ) -> Result<Room, ChatError> {
        request.validate().map_err(validation_error)?;
        RoomKey::derive(&request.sender, &request.receiver)?;
        Self::ensure_identity(identity, &request.sender)?;

        self.require_user(&request.sender, "Sender").await?;
        self.require_user(&request.receiver, "Receiver").await?;

        Ok(self
            .rooms
            .resolve(&request.sender, &request.receiver)
            .await?)
    }

    async fn history(&self, room: &Room) -> Result<Vec<ChatMessageDto>, ChatError> {
        let entries = self.message_repo.history(room.id).await?;

        Ok(entries
            .into_iter()
            .map(|entry| ChatMessageDto {
                receiver: room
                    .peer_of(&entry.sender_username)
                    .unwrap_or_default()
                    .to_string(),
                sender: entry.sender_username,
                text: entry.message.text,
                created_at: entry.message.created_at,
            })
            .collect())
    }

    async fn send(
        &self,
        identity: &str,
        request: &SendMessageRequest,
    ) -> Result<(Room, ChatMessageDto), ChatError> {
        request.validate().map_err(validation_error)?;
        RoomKey::derive(&request.sender, &request.receiver)?;
        Self::ensure_identity(identity, &request.sender)?;

        let text = request.text.trim();
        if text.is_empty() || text.chars().count() > MAX_MESSAGE_LENGTH {
            return Err(ChatError::Validation(
                "Message must be 1-2000 characters".into(),
            ));
        }

        let sender = self.require_user(&request.sender, "Sender").await?;
        self.require_user(&request.receiver, "Receiver").await?;

        let room = self
            .rooms
            .resolve(&request.sender, &request.receiver)
            .await?;

        let stored = self
            .message_repo
            .create(&Message {
                id: self.id_generator.generate(),
                room_id: room.id,
                sender_id: sender.id,
                text: text.to_string(),
                created_at: Utc::now(),
            })
            .await?;
        metrics::MESSAGES_PERSISTED_TOTAL.inc();

        let dto = ChatMessageDto {
            sender: request.sender.clone(),
            receiver: request.receiver.clone(),
            text: stored.text,
            created_at: stored.created_at,
        };

        Ok((room, dto))
    }
}
