//! Repository Implementations
//!
//! PostgreSQL implementations of domain repository traits.
//!
//! - **PgUserRepository** - Accounts and OTP state
//! - **PgRoomRepository** - Two-party rooms keyed by canonical room key
//! - **PgMessageRepository** - Append-only messages and history replay
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use sqlx::PgPool;
//! use crate::infrastructure::repositories::{
//!     PgMessageRepository, PgRoomRepository, PgUserRepository,
//! };
//!
//! async fn setup_repositories(pool: PgPool) {
//!     let user_repo = PgUserRepository::new(pool.clone());
//!     let room_repo = PgRoomRepository::new(pool.clone());
//!     let message_repo = PgMessageRepository::new(pool);
//! }
//! ```

pub mod message_repository;
pub mod room_repository;
pub mod user_repository;

pub use message_repository::PgMessageRepository;
pub use room_repository::PgRoomRepository;
pub use user_repository::PgUserRepository;
