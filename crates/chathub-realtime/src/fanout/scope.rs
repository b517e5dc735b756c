//! Publish scope selectors.

use std::fmt;

use serde::{Deserialize, Serialize};

use chathub_core::types::id::{RoomId, UserId};

/// An opaque, already-serialized event body.
///
/// `Bytes` is reference counted, so one fanout shares a single allocation
/// across every recipient queue.
pub type Payload = bytes::Bytes;

/// Which connections a published payload is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum Scope {
    /// Every live connection owned by the user.
    ToUser(UserId),
    /// Every connection currently subscribed to the room.
    ToRoom(RoomId),
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::ToUser(id) => write!(f, "user:{id}"),
            Scope::ToRoom(id) => write!(f, "room:{id}"),
        }
    }
}
