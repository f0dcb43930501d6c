//! Application Services
//!
//! Business logic services that coordinate domain operations.
//!
//! ## Available Services
//!
//! - **AuthService**: Registration, OTP verification, login and JWT tokens
//! - **UserService**: User directory
//! - **RoomService**: Canonical room resolution for a participant pair
//! - **ChatService**: Joining rooms, history replay and message persistence

pub mod auth_service;
pub mod chat_service;
pub mod room_service;
pub mod user_service;

pub use auth_service::{decode_token, AuthError, AuthService, AuthServiceImpl, Claims};
pub use chat_service::{ChatError, ChatMessageDto, ChatService, ChatServiceImpl};
pub use room_service::{RoomError, RoomService, RoomServiceImpl};
pub use user_service::{UserService, UserServiceImpl};
