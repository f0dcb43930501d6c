//! Snowflake ID Generator
//!
//! Time-ordered 64-bit ids for users, rooms and messages. Ids issued by one
//! generator are strictly increasing, which gives messages created in the
//! same millisecond a stable order.
//!
//! ```text
//! 63       22          12          0
//! +---------+-----------+-----------+
//! | ms since| machine   | sequence  |
//! |  epoch  | (10 bits) | (12 bits) |
//! +---------+-----------+-----------+
//! ```

use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;

const MACHINE_BITS: u64 = 10;
const SEQUENCE_BITS: u64 = 12;
const MAX_SEQUENCE: u64 = (1 << SEQUENCE_BITS) - 1;
const MAX_MACHINE_ID: u64 = (1 << MACHINE_BITS) - 1;

#[derive(Debug, Default)]
struct Clock {
    last_ms: u64,
    sequence: u64,
}

/// Snowflake ID generator
#[derive(Debug)]
pub struct SnowflakeGenerator {
    epoch_ms: u64,
    machine_id: u64,
    clock: Mutex<Clock>,
}

impl SnowflakeGenerator {
    /// Create a generator for `machine_id` counting from `epoch_ms`.
    pub fn new(machine_id: u16, epoch_ms: u64) -> Self {
        Self {
            epoch_ms,
            machine_id: u64::from(machine_id) & MAX_MACHINE_ID,
            clock: Mutex::new(Clock::default()),
        }
    }

    /// Generate a new snowflake ID
    pub fn generate(&self) -> i64 {
        let mut clock = self.clock.lock();
        let mut now = self.now_ms().max(clock.last_ms);

        if now == clock.last_ms {
            clock.sequence = (clock.sequence + 1) & MAX_SEQUENCE;
            if clock.sequence == 0 {
                // Sequence exhausted for this millisecond; borrow the next one.
                now = clock.last_ms + 1;
            }
        } else {
            clock.sequence = 0;
        }
        clock.last_ms = now;

        let elapsed = now.saturating_sub(self.epoch_ms);
        ((elapsed << (MACHINE_BITS + SEQUENCE_BITS))
            | (self.machine_id << SEQUENCE_BITS)
            | clock.sequence) as i64
    }

    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(self.epoch_ms)
    }
}
