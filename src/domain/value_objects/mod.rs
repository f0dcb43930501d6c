//! Value Objects
//!
//! Immutable domain values with no identity of their own.

pub mod room_key;

pub use room_key::{InvalidParticipants, RoomKey, ROOM_KEY_SEPARATOR};
