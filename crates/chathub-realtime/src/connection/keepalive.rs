//! Ping/pong keepalive for WebSocket connections.
//!
//! The writer loop owns the ping ticker; the reader loop owns the read
//! deadline, which slides forward on every pong.

use std::time::Duration;

use tokio::time::{self, Instant, Interval, MissedTickBehavior};

use chathub_core::config::RealtimeConfig;

/// Keepalive configuration
#[derive(Debug, Clone, Copy)]
pub struct KeepaliveConfig {
    /// Interval between pings
    pub ping_interval: Duration,
    /// How long the reader waits for any frame before giving up
    pub pong_wait: Duration,
    /// Upper bound on a single write
    pub write_wait: Duration,
}

impl From<&RealtimeConfig> for KeepaliveConfig {
    fn from(config: &RealtimeConfig) -> Self {
        Self {
            ping_interval: config.ping_interval(),
            pong_wait: config.pong_wait(),
            write_wait: config.write_wait(),
        }
    }
}

impl Default for KeepaliveConfig {
    fn default() -> Self {
        Self::from(&RealtimeConfig::default())
    }
}

impl KeepaliveConfig {
    /// Build a ticker whose first tick fires one full period from now.
    pub fn ping_ticker(&self) -> Interval {
        let mut ticker = time::interval_at(Instant::now() + self.ping_interval, self.ping_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    }

    /// Start a read deadline `pong_wait` from now.
    pub fn read_deadline(&self) -> ReadDeadline {
        ReadDeadline::new(self.pong_wait)
    }
}

/// Sliding read deadline.
#[derive(Debug, Clone, Copy)]
pub struct ReadDeadline {
    window: Duration,
    expires_at: Instant,
}

impl ReadDeadline {
    fn new(window: Duration) -> Self {
        Self {
            window,
            expires_at: Instant::now() + window,
        }
    }

    /// Push the deadline a full window past now.
    pub fn reset(&mut self) {
        self.expires_at = Instant::now() + self.window;
    }

    /// Instant at which the read fails.
    pub fn instant(&self) -> Instant {
        self.expires_at
    }
}
