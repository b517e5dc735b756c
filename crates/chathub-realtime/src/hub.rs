//! Hub: the cloneable front door to one registry actor.
//!
//! The same type serves both deployments. A [`HubVariant::Rooms`] hub
//! accepts subscribe/unsubscribe control frames and fans out by room; a
//! [`HubVariant::Users`] hub only fans out by user.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use chathub_core::config::RealtimeConfig;
use chathub_core::error::AppError;
use chathub_core::result::AppResult;
use chathub_core::types::id::{ConnectionId, RoomId, UserId};

use crate::connection::handle::ConnectionHandle;
use crate::fanout::{FanoutReport, Payload, Scope};
use crate::message::serializer::to_payload;
use crate::metrics::{HubMetrics, MetricsSnapshot};
use crate::registry::command::Command;
use crate::registry::{RegistryActor, RegistrySnapshot, SubscriptionChange};

/// Which scoping a hub supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HubVariant {
    /// Chat messages, fanned out by room.
    Rooms,
    /// Notifications, fanned out by user.
    Users,
}

impl HubVariant {
    /// Whether clients may send subscribe/unsubscribe frames.
    pub fn accepts_control_frames(self) -> bool {
        matches!(self, HubVariant::Rooms)
    }

    /// Name used in routes and logs.
    pub fn name(self) -> &'static str {
        match self {
            HubVariant::Rooms => "messages",
            HubVariant::Users => "notifications",
        }
    }
}

impl fmt::Display for HubVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Cloneable handle to a running hub.
#[derive(Clone)]
pub struct Hub {
    variant: HubVariant,
    commands: mpsc::UnboundedSender<Command>,
    config: Arc<RealtimeConfig>,
    metrics: Arc<HubMetrics>,
}

impl fmt::Debug for Hub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hub")
            .field("variant", &self.variant)
            .field("running", &!self.commands.is_closed())
            .finish()
    }
}

impl Hub {
    /// Start a registry actor and return a handle to it.
    ///
    /// Must be called inside a tokio runtime.
    pub fn spawn(variant: HubVariant, config: RealtimeConfig) -> Self {
        let (commands, rx) = mpsc::unbounded_channel();
        let metrics = Arc::new(HubMetrics::new());

        RegistryActor::new(variant, rx, metrics.clone()).spawn();

        Self {
            variant,
            commands,
            config: Arc::new(config),
            metrics,
        }
    }

    /// Hub variant.
    pub fn variant(&self) -> HubVariant {
        self.variant
    }

    /// Realtime settings this hub was started with.
    pub fn config(&self) -> &RealtimeConfig {
        &self.config
    }

    /// Shared metrics.
    pub fn metrics(&self) -> &HubMetrics {
        &self.metrics
    }

    /// Point-in-time metrics.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Whether the registry actor is still accepting commands.
    pub fn is_running(&self) -> bool {
        !self.commands.is_closed()
    }

    /// Register a new connection for `user_id`.
    ///
    /// Returns the registration guard and the receiving end of the
    /// connection's outbound queue. Dropping the guard unregisters.
    pub async fn register(
        &self,
        user_id: UserId,
    ) -> AppResult<(Registration, mpsc::Receiver<Payload>)> {
        let (handle, outbound) = ConnectionHandle::new(user_id, self.config.outbound_queue_capacity);
        let id = handle.id;

        let (reply, rx) = oneshot::channel();
        self.send(Command::Register { handle, reply })?;
        rx.await.map_err(|_| self.stopped())?;

        let registration = Registration {
            id,
            user_id,
            hub: self.clone(),
            released: false,
        };
        Ok((registration, outbound))
    }

    /// Remove a connection and close its outbound queue.
    ///
    /// Returns whether the connection was still registered. Repeated calls
    /// are no-ops.
    pub async fn unregister(&self, id: ConnectionId) -> bool {
        let (reply, rx) = oneshot::channel();
        if self
            .send(Command::Unregister {
                id,
                reply: Some(reply),
            })
            .is_err()
        {
            return false;
        }
        rx.await.unwrap_or(false)
    }

    pub(crate) fn unregister_detached(&self, id: ConnectionId) {
        // A stopped actor has already dropped every handle.
        let _ = self.commands.send(Command::Unregister { id, reply: None });
    }

    /// Add a connection to a room.
    pub async fn subscribe(&self, id: ConnectionId, room_id: RoomId) -> AppResult<SubscriptionChange> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Subscribe { id, room_id, reply })?;
        rx.await.map_err(|_| self.stopped())
    }

    /// Remove a connection from a room.
    pub async fn unsubscribe(
        &self,
        id: ConnectionId,
        room_id: RoomId,
    ) -> AppResult<SubscriptionChange> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Unsubscribe { id, room_id, reply })?;
        rx.await.map_err(|_| self.stopped())
    }

    /// Fan an already-serialized payload out to `scope`.
    ///
    /// Waits only for the registry to apply the fanout, never for a
    /// recipient. A stopped hub yields an empty report.
    pub async fn publish(&self, scope: Scope, payload: Payload) -> FanoutReport {
        let (reply, rx) = oneshot::channel();
        let command = Command::Publish {
            scope,
            payload,
            reply,
        };
        if self.commands.send(command).is_err() {
            debug!(hub = %self.variant, scope = %scope, "Publish on stopped hub ignored");
            return FanoutReport::default();
        }
        rx.await.unwrap_or_default()
    }

    /// Deliver to every connection of a user.
    pub async fn publish_to_user(&self, user_id: UserId, payload: Payload) -> FanoutReport {
        self.publish(Scope::ToUser(user_id), payload).await
    }

    /// Deliver to every subscriber of a room.
    pub async fn publish_to_room(&self, room_id: RoomId, payload: Payload) -> FanoutReport {
        if !self.variant.accepts_control_frames() {
            warn!(hub = %self.variant, room_id = %room_id, "Room publish on user-scoped hub");
        }
        self.publish(Scope::ToRoom(room_id), payload).await
    }

    /// Serialize `event` once and fan the bytes out to `scope`.
    pub async fn publish_event<T>(&self, scope: Scope, event: &T) -> AppResult<FanoutReport>
    where
        T: Serialize + ?Sized,
    {
        let payload = to_payload(event)?;
        Ok(self.publish(scope, payload).await)
    }

    /// Current registry contents.
    pub async fn snapshot(&self) -> AppResult<RegistrySnapshot> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Snapshot { reply })?;
        rx.await.map_err(|_| self.stopped())
    }

    /// Close every outbound queue and stop the actor.
    ///
    /// Returns how many connections were closed. Calling it on a stopped
    /// hub returns 0.
    pub async fn shutdown(&self) -> usize {
        let (reply, rx) = oneshot::channel();
        if self.send(Command::Shutdown { reply }).is_err() {
            return 0;
        }
        rx.await.unwrap_or(0)
    }

    fn send(&self, command: Command) -> AppResult<()> {
        self.commands.send(command).map_err(|_| self.stopped())
    }

    fn stopped(&self) -> AppError {
        AppError::service_unavailable(format!("{} hub is not running", self.variant))
    }
}

/// Proof of a live registration.
///
/// Not `Clone`: exactly one owner, so the unregister it triggers on drop
/// happens exactly once.
#[derive(Debug)]
pub struct Registration {
    id: ConnectionId,
    user_id: UserId,
    hub: Hub,
    released: bool,
}

impl Registration {
    /// Connection ID assigned at register time.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Owner of the connection.
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Unregister now and wait for the registry to confirm.
    pub async fn release(mut self) -> bool {
        self.released = true;
        self.hub.unregister(self.id).await
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        if !self.released {
            self.hub.unregister_detached(self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use chathub_core::error::ErrorKind;

    use super::*;

    fn rooms() -> Hub {
        Hub::spawn(HubVariant::Rooms, RealtimeConfig::default())
    }

    #[tokio::test]
    async fn test_register_and_publish_to_user() {
        let hub = rooms();
        let (_a, mut a_rx) = hub.register(UserId(42)).await.unwrap();
        let (_b, mut b_rx) = hub.register(UserId(42)).await.unwrap();

        let report = hub.publish_to_user(UserId(42), Payload::from_static(b"x")).await;

        assert_eq!(report.delivered, 2);
        assert_eq!(a_rx.recv().await.unwrap(), "x");
        assert_eq!(b_rx.recv().await.unwrap(), "x");
    }

    #[tokio::test]
    async fn test_dropping_registration_closes_queue() {
        let hub = rooms();
        let (registration, mut rx) = hub.register(UserId(1)).await.unwrap();

        drop(registration);

        assert!(rx.recv().await.is_none());
        let snapshot = hub.snapshot().await.unwrap();
        assert_eq!(snapshot.connection_count, 0);
    }

    #[tokio::test]
    async fn test_release_then_unregister_is_noop() {
        let hub = rooms();
        let (registration, _rx) = hub.register(UserId(1)).await.unwrap();
        let id = registration.id();

        assert!(registration.release().await);
        assert!(!hub.unregister(id).await);
        assert_eq!(hub.metrics_snapshot().connections_active, 0);
    }

    #[tokio::test]
    async fn test_room_subscription_round_trip() {
        let hub = rooms();
        let (c, mut c_rx) = hub.register(UserId(1)).await.unwrap();
        let (_d, mut d_rx) = hub.register(UserId(2)).await.unwrap();

        let change = hub.subscribe(c.id(), RoomId(7)).await.unwrap();
        assert_eq!(change, SubscriptionChange::Added);

        let report = hub.publish_to_room(RoomId(7), Payload::from_static(b"y")).await;
        assert_eq!(report.delivered, 1);
        assert_eq!(c_rx.recv().await.unwrap(), "y");
        assert!(d_rx.try_recv().is_err());

        let change = hub.unsubscribe(c.id(), RoomId(7)).await.unwrap();
        assert_eq!(change, SubscriptionChange::Removed);
        assert_eq!(hub.snapshot().await.unwrap().room_count, 0);
    }

    #[tokio::test]
    async fn test_user_hub_rejects_subscribe() {
        let hub = Hub::spawn(HubVariant::Users, RealtimeConfig::default());
        let (registration, _rx) = hub.register(UserId(1)).await.unwrap();

        let change = hub.subscribe(registration.id(), RoomId(7)).await.unwrap();

        assert_eq!(change, SubscriptionChange::Unsupported);
        assert_eq!(hub.snapshot().await.unwrap().room_count, 0);
    }

    #[tokio::test]
    async fn test_publish_event_serializes_once() {
        let hub = rooms();
        let (_a, mut a_rx) = hub.register(UserId(5)).await.unwrap();
        let (_b, mut b_rx) = hub.register(UserId(5)).await.unwrap();

        let event = serde_json::json!({"type": "like", "id": 1});
        hub.publish_event(Scope::ToUser(UserId(5)), &event).await.unwrap();

        let first = a_rx.recv().await.unwrap();
        let second = b_rx.recv().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.as_ptr(), second.as_ptr());
    }

    #[tokio::test]
    async fn test_shutdown_closes_queues_and_stops() {
        let hub = rooms();
        let (_a, mut a_rx) = hub.register(UserId(1)).await.unwrap();
        let (_b, mut b_rx) = hub.register(UserId(2)).await.unwrap();

        assert_eq!(hub.shutdown().await, 2);

        assert!(a_rx.recv().await.is_none());
        assert!(b_rx.recv().await.is_none());

        let err = hub.register(UserId(3)).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::ServiceUnavailable);
        assert!(hub.publish_to_user(UserId(1), Payload::new()).await.is_empty());
        assert_eq!(hub.shutdown().await, 0);
    }
}
