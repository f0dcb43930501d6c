//! WebSocket Session Liveness

use std::time::{Duration, Instant};

/// Extra time a silent connection gets past one heartbeat interval
pub const HEARTBEAT_GRACE: Duration = Duration::from_secs(10);

/// Per-connection liveness tracking
#[derive(Debug)]
pub struct SessionState {
    pub username: String,
    pub last_seen: Instant,
    timeout: Duration,
}

impl SessionState {
    pub fn new(username: String, heartbeat_interval_ms: u64) -> Self {
        Self {
            username,
            last_seen: Instant::now(),
            timeout: Duration::from_millis(heartbeat_interval_ms) + HEARTBEAT_GRACE,
        }
    }

    /// Record that a frame (of any kind) arrived.
    pub fn touch(&mut self) {
        self.last_seen = Instant::now();
    }

    pub fn is_alive(&self) -> bool {
        self.last_seen.elapsed() < self.timeout
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// How often the reader re-checks liveness. A silent peer is closed at
    /// most this long after its timeout elapses.
    pub fn check_interval(&self) -> Duration {
        (HEARTBEAT_GRACE / 2).min(self.timeout / 2)
    }
}
