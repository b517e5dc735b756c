//! Real-time hub configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Real-time (WebSocket) hub configuration, shared by both hub variants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Capacity of each connection's outbound queue.
    #[serde(default = "default_queue_capacity")]
    pub outbound_queue_capacity: usize,
    /// Interval between server pings. Must be shorter than `pong_wait_seconds`.
    #[serde(default = "default_ping_interval")]
    pub ping_interval_seconds: u64,
    /// Read deadline; reset whenever the peer answers a ping.
    #[serde(default = "default_pong_wait")]
    pub pong_wait_seconds: u64,
    /// Time allowed for a single frame write.
    #[serde(default = "default_write_wait")]
    pub write_wait_seconds: u64,
    /// Largest inbound frame accepted from a peer, in bytes.
    #[serde(default = "default_max_message_size")]
    pub max_message_size: usize,
}

impl RealtimeConfig {
    /// Ping period as a [`Duration`].
    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_seconds)
    }

    /// Read deadline as a [`Duration`].
    pub fn pong_wait(&self) -> Duration {
        Duration::from_secs(self.pong_wait_seconds)
    }

    /// Write deadline as a [`Duration`].
    pub fn write_wait(&self) -> Duration {
        Duration::from_secs(self.write_wait_seconds)
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            outbound_queue_capacity: default_queue_capacity(),
            ping_interval_seconds: default_ping_interval(),
            pong_wait_seconds: default_pong_wait(),
            write_wait_seconds: default_write_wait(),
            max_message_size: default_max_message_size(),
        }
    }
}

fn default_queue_capacity() -> usize {
    256
}

// 9/10 of the pong wait
fn default_ping_interval() -> u64 {
    54
}

fn default_pong_wait() -> u64 {
    60
}

fn default_write_wait() -> u64 {
    10
}

fn default_max_message_size() -> usize {
    4096
}
