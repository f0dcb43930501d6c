//! WebSocket Message Types
//!
//! Every frame is a JSON envelope `{"event": <name>, "data": <payload>}`.

use serde::{Deserialize, Serialize};

use crate::application::dto::{JoinRoomRequest, SendMessageRequest};
use crate::application::services::ChatMessageDto;

/// Events a client may send
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    JoinRoom(JoinRoomRequest),
    SendMessage(SendMessageRequest),
}

impl ClientEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::JoinRoom(_) => "join-room",
            ClientEvent::SendMessage(_) => "send-message",
        }
    }
}

/// Events the server emits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// Room history, sent only to the joining connection
    ChatHistory { messages: Vec<ChatMessageDto> },
    /// A new message, broadcast to the room
    Message(ChatMessageDto),
    Error { message: String },
}

impl ServerEvent {
    pub fn error(message: impl Into<String>) -> Self {
        ServerEvent::Error {
            message: message.into(),
        }
    }
}
