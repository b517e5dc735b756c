//! Registry-side handle of a single connection.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use chathub_core::types::id::{ConnectionId, RoomId, UserId};

use crate::fanout::Payload;

/// Result of a non-blocking enqueue onto one connection's outbound queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The payload was queued for the writer loop.
    Enqueued,
    /// The queue was full; the payload was discarded for this connection.
    Dropped,
    /// The writer loop is gone; the connection is dead.
    Closed,
}

/// A handle to a single live connection, owned by the registry.
///
/// The handle holds the **only** sender of the connection's outbound queue.
/// Dropping the handle closes the queue, which makes the writer loop send a
/// close frame and exit. The handle is deliberately not `Clone`.
#[derive(Debug)]
pub struct ConnectionHandle {
    /// Unique connection ID
    pub id: ConnectionId,
    /// Authenticated owner, fixed for the connection's lifetime
    pub user_id: UserId,
    /// When the connection was registered
    pub connected_at: DateTime<Utc>,
    sender: mpsc::Sender<Payload>,
    subscriptions: HashSet<RoomId>,
}

impl ConnectionHandle {
    /// Create a handle together with the receiving end of its outbound queue.
    pub fn new(user_id: UserId, capacity: usize) -> (Self, mpsc::Receiver<Payload>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let handle = Self {
            id: ConnectionId::new(),
            user_id,
            connected_at: Utc::now(),
            sender,
            subscriptions: HashSet::new(),
        };
        (handle, receiver)
    }

    /// Attempt to queue `payload` without waiting.
    pub fn try_enqueue(&self, payload: &Payload) -> Delivery {
        match self.sender.try_send(payload.clone()) {
            Ok(()) => Delivery::Enqueued,
            Err(mpsc::error::TrySendError::Full(_)) => Delivery::Dropped,
            Err(mpsc::error::TrySendError::Closed(_)) => Delivery::Closed,
        }
    }

    /// Rooms this connection is subscribed to.
    pub fn subscriptions(&self) -> impl Iterator<Item = &RoomId> {
        self.subscriptions.iter()
    }

    /// Check if subscribed to a room
    pub fn is_subscribed(&self, room_id: RoomId) -> bool {
        self.subscriptions.contains(&room_id)
    }

    pub(crate) fn add_subscription(&mut self, room_id: RoomId) -> bool {
        self.subscriptions.insert(room_id)
    }

    pub(crate) fn remove_subscription(&mut self, room_id: RoomId) -> bool {
        self.subscriptions.remove(&room_id)
    }

    /// Get a snapshot of connection info
    pub fn info(&self) -> ConnectionInfo {
        let mut subscriptions: Vec<RoomId> = self.subscriptions.iter().copied().collect();
        subscriptions.sort();
        ConnectionInfo {
            id: self.id,
            user_id: self.user_id,
            connected_at: self.connected_at,
            subscriptions,
            queued: self.sender.max_capacity() - self.sender.capacity(),
        }
    }
}

/// Snapshot of connection info (serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionInfo {
    /// Connection ID
    pub id: ConnectionId,
    /// User ID
    pub user_id: UserId,
    /// Connected at
    pub connected_at: DateTime<Utc>,
    /// Subscribed rooms
    pub subscriptions: Vec<RoomId>,
    /// Payloads waiting in the outbound queue
    pub queued: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enqueue_until_full() {
        let (handle, mut rx) = ConnectionHandle::new(UserId(1), 2);
        let payload = Payload::from_static(b"x");

        assert_eq!(handle.try_enqueue(&payload), Delivery::Enqueued);
        assert_eq!(handle.try_enqueue(&payload), Delivery::Enqueued);
        assert_eq!(handle.try_enqueue(&payload), Delivery::Dropped);
        assert_eq!(handle.info().queued, 2);

        assert_eq!(rx.try_recv().expect("queued"), payload);
    }

    #[test]
    fn test_enqueue_after_receiver_gone() {
        let (handle, rx) = ConnectionHandle::new(UserId(1), 2);
        drop(rx);
        assert_eq!(
            handle.try_enqueue(&Payload::from_static(b"x")),
            Delivery::Closed
        );
    }

    #[test]
    fn test_dropping_handle_closes_queue() {
        let (handle, mut rx) = ConnectionHandle::new(UserId(1), 2);
        handle.try_enqueue(&Payload::from_static(b"last"));
        drop(handle);

        assert_eq!(rx.try_recv().expect("drained"), Payload::from_static(b"last"));
        assert!(matches!(
            rx.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        ));
    }
}
