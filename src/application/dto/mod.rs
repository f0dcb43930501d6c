//! Data Transfer Objects
//!
//! DTOs for API request/response serialization.

pub mod request;
pub mod response;

pub use request::{
    JoinRoomRequest, LoginRequest, RegisterRequest, ResendOtpRequest, SendMessageRequest,
    VerifyOtpRequest,
};
pub use response::{LoginResponse, MessageResponse, UserListItem, UserSummary};
