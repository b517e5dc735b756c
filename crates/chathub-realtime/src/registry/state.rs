//! Registry state: the three membership indices and every mutation on them.
//!
//! `RegistryState` is plain data with synchronous methods. It is owned by a
//! single actor task, so no method here needs a lock, and no method performs
//! I/O.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use chathub_core::types::id::{ConnectionId, RoomId, UserId};

use crate::connection::handle::{ConnectionHandle, ConnectionInfo};
use crate::fanout::{FanoutReport, Payload, Scope, fan_out};

/// Outcome of a subscribe/unsubscribe request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionChange {
    /// Membership was added.
    Added,
    /// Membership was removed.
    Removed,
    /// Nothing changed (already subscribed / never subscribed).
    Unchanged,
    /// The connection is not registered (already gone).
    UnknownConnection,
    /// The hub variant has no rooms.
    Unsupported,
}

/// Registry of all live connections.
#[derive(Debug, Default)]
pub struct RegistryState {
    /// Connection ID → handle.
    by_id: HashMap<ConnectionId, ConnectionHandle>,
    /// User ID → live connection IDs. Never holds an empty set.
    by_user: HashMap<UserId, HashSet<ConnectionId>>,
    /// Room ID → subscribed connection IDs. Never holds an empty set.
    by_room: HashMap<RoomId, HashSet<ConnectionId>>,
}

impl RegistryState {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a connection into `by_id` and its owner's bucket.
    pub fn register(&mut self, handle: ConnectionHandle) {
        let id = handle.id;
        let user_id = handle.user_id;

        let previous = self.by_id.insert(id, handle);
        debug_assert!(previous.is_none(), "connection {id} registered twice");

        self.by_user.entry(user_id).or_default().insert(id);
    }

    /// Removes a connection from every index.
    ///
    /// Returns the removed handle; dropping it closes the outbound queue.
    /// Unknown ids are a no-op, which makes repeated calls harmless.
    pub fn unregister(&mut self, id: ConnectionId) -> Option<ConnectionHandle> {
        let handle = self.by_id.remove(&id)?;

        remove_member(&mut self.by_user, handle.user_id, id);
        for room_id in handle.subscriptions() {
            remove_member(&mut self.by_room, *room_id, id);
        }

        Some(handle)
    }

    /// Adds `id` to the room. Re-subscribing is a no-op.
    pub fn subscribe(&mut self, id: ConnectionId, room_id: RoomId) -> SubscriptionChange {
        let Some(handle) = self.by_id.get_mut(&id) else {
            return SubscriptionChange::UnknownConnection;
        };

        if !handle.add_subscription(room_id) {
            return SubscriptionChange::Unchanged;
        }
        self.by_room.entry(room_id).or_default().insert(id);
        SubscriptionChange::Added
    }

    /// Removes `id` from the room, forgetting the room when it empties.
    pub fn unsubscribe(&mut self, id: ConnectionId, room_id: RoomId) -> SubscriptionChange {
        let Some(handle) = self.by_id.get_mut(&id) else {
            return SubscriptionChange::UnknownConnection;
        };

        if !handle.remove_subscription(room_id) {
            return SubscriptionChange::Unchanged;
        }
        remove_member(&mut self.by_room, room_id, id);
        SubscriptionChange::Removed
    }

    /// Resolves `scope` and enqueues `payload` on every match.
    ///
    /// Connections whose writer has already exited are unregistered here,
    /// in the same step, and listed in [`FanoutReport::stale`].
    pub fn publish(&mut self, scope: Scope, payload: &Payload) -> FanoutReport {
        let members = match scope {
            Scope::ToUser(user_id) => self.by_user.get(&user_id),
            Scope::ToRoom(room_id) => self.by_room.get(&room_id),
        };

        let report = match members {
            Some(ids) => fan_out(ids.iter().filter_map(|id| self.by_id.get(id)), payload),
            None => FanoutReport::default(),
        };

        for id in &report.stale {
            self.unregister(*id);
        }

        report
    }

    /// Removes every connection, returning the handles so the caller
    /// decides when their queues close.
    pub fn drain(&mut self) -> Vec<ConnectionHandle> {
        self.by_user.clear();
        self.by_room.clear();
        self.by_id.drain().map(|(_, handle)| handle).collect()
    }

    /// Returns the live connection IDs of a user.
    pub fn user_connections(&self, user_id: UserId) -> Vec<ConnectionId> {
        self.by_user
            .get(&user_id)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Returns the connection IDs subscribed to a room.
    pub fn room_members(&self, room_id: RoomId) -> Vec<ConnectionId> {
        self.by_room
            .get(&room_id)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Returns whether the user has a bucket (i.e. is online).
    pub fn has_user(&self, user_id: UserId) -> bool {
        self.by_user.contains_key(&user_id)
    }

    /// Returns whether the room has a bucket.
    pub fn has_room(&self, room_id: RoomId) -> bool {
        self.by_room.contains_key(&room_id)
    }

    /// Returns the total connection count.
    pub fn connection_count(&self) -> usize {
        self.by_id.len()
    }

    /// Returns the number of users with at least one connection.
    pub fn user_count(&self) -> usize {
        self.by_user.len()
    }

    /// Returns the number of rooms with at least one subscriber.
    pub fn room_count(&self) -> usize {
        self.by_room.len()
    }

    /// Verifies that the indices agree with each other.
    ///
    /// Every id in a user or room bucket is registered, every registered id
    /// sits in exactly its owner's bucket and in exactly the rooms it
    /// subscribed to, and no bucket is empty.
    pub fn check_invariants(&self) -> Result<(), String> {
        for (user_id, ids) in &self.by_user {
            if ids.is_empty() {
                return Err(format!("empty bucket for user {user_id}"));
            }
            for id in ids {
                match self.by_id.get(id) {
                    Some(handle) if handle.user_id == *user_id => {}
                    Some(_) => return Err(format!("connection {id} filed under wrong user")),
                    None => return Err(format!("dangling connection {id} in user {user_id}")),
                }
            }
        }

        for (room_id, ids) in &self.by_room {
            if ids.is_empty() {
                return Err(format!("empty bucket for room {room_id}"));
            }
            for id in ids {
                match self.by_id.get(id) {
                    Some(handle) if handle.is_subscribed(*room_id) => {}
                    Some(_) => return Err(format!("connection {id} in room {room_id} unsubscribed")),
                    None => return Err(format!("dangling connection {id} in room {room_id}")),
                }
            }
        }

        for (id, handle) in &self.by_id {
            let in_user = self
                .by_user
                .get(&handle.user_id)
                .is_some_and(|ids| ids.contains(id));
            if !in_user {
                return Err(format!("connection {id} missing from its user bucket"));
            }
            for room_id in handle.subscriptions() {
                let in_room = self.by_room.get(room_id).is_some_and(|ids| ids.contains(id));
                if !in_room {
                    return Err(format!("connection {id} missing from room {room_id}"));
                }
            }
        }

        Ok(())
    }

    /// Builds a serializable view of the registry.
    pub fn snapshot(&self) -> RegistrySnapshot {
        let mut connections: Vec<ConnectionInfo> =
            self.by_id.values().map(ConnectionHandle::info).collect();
        connections.sort_by_key(|info| info.connected_at);

        RegistrySnapshot {
            connection_count: self.connection_count(),
            user_count: self.user_count(),
            room_count: self.room_count(),
            connections,
        }
    }
}

/// Serializable view of the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    /// Live connections
    pub connection_count: usize,
    /// Users with at least one connection
    pub user_count: usize,
    /// Rooms with at least one subscriber
    pub room_count: usize,
    /// Per-connection details
    pub connections: Vec<ConnectionInfo>,
}

fn remove_member<K>(index: &mut HashMap<K, HashSet<ConnectionId>>, key: K, id: ConnectionId)
where
    K: std::hash::Hash + Eq,
{
    if let Some(ids) = index.get_mut(&key) {
        ids.remove(&id);
        if ids.is_empty() {
            index.remove(&key);
        }
    }
}
