//! # Domain Entities
//!
//! Core domain entities. All entities map directly to their database tables.
//!
//! - **User**: account with credentials and email verification state
//! - **Room**: a private conversation between exactly two users
//! - **Message**: an immutable message inside a room
//!
//! ## Repository Traits
//!
//! Each entity has an associated repository trait defining data access operations.
//! These traits are implemented in the infrastructure layer, following the
//! dependency inversion principle.

mod message;
mod room;
mod user;

pub use message::{HistoryEntry, Message, MessageRepository, MAX_MESSAGE_LENGTH};
pub use room::{Room, RoomRepository};
pub use user::{User, UserRepository};

#[cfg(test)]
pub use user::MockUserRepository;
