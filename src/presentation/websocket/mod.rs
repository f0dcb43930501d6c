//! WebSocket Gateway
//!
//! Real-time private messaging over WebSocket connections.

pub mod gateway;
pub mod handler;
pub mod messages;
pub mod session;

pub use gateway::{ConnectionId, Gateway};
pub use handler::{dispatch_frame, ws_handler};
pub use messages::{ClientEvent, ServerEvent};
pub use session::SessionState;
