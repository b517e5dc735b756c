//! Connection state machine.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::error;

use chathub_core::types::id::ConnectionId;

/// Lifecycle state of one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// Authenticated, not yet registered
    Connecting,
    /// Registered; both loops running
    Active,
    /// A loop exited; unregister in flight
    Closing,
    /// Unregistered and both loops done
    Closed,
}

impl ConnectionState {
    /// Whether `self -> next` is a legal transition.
    pub fn can_advance_to(self, next: ConnectionState) -> bool {
        use ConnectionState::*;
        matches!(
            (self, next),
            (Connecting, Active) | (Connecting, Closing) | (Active, Closing) | (Closing, Closed)
        )
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionState::Connecting => "connecting",
            ConnectionState::Active => "active",
            ConnectionState::Closing => "closing",
            ConnectionState::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// Tracks the state of one session.
#[derive(Debug)]
pub struct Lifecycle {
    conn_id: Option<ConnectionId>,
    state: ConnectionState,
}

impl Lifecycle {
    /// Start in `Connecting`.
    pub fn new() -> Self {
        Self {
            conn_id: None,
            state: ConnectionState::Connecting,
        }
    }

    /// Attach the id assigned at register time (for logging).
    pub fn bind(&mut self, conn_id: ConnectionId) {
        self.conn_id = Some(conn_id);
    }

    /// Current state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Move to `next`.
    ///
    /// An illegal transition is a bug: it panics in debug builds and is
    /// logged (and ignored) in release builds.
    pub fn advance(&mut self, next: ConnectionState) {
        let current = self.state;
        debug_assert!(
            current.can_advance_to(next),
            "illegal connection transition {current} -> {next}"
        );
        if !current.can_advance_to(next) {
            error!(
                conn_id = ?self.conn_id,
                from = %current,
                to = %next,
                "Illegal connection state transition"
            );
            return;
        }
        self.state = next;
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}
