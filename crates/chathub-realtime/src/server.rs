//! Top-level real-time engine holding both hub deployments.

use serde::{Deserialize, Serialize};
use tracing::info;

use chathub_core::config::RealtimeConfig;
use chathub_core::result::AppResult;

use crate::hub::{Hub, HubVariant};
use crate::metrics::MetricsSnapshot;

/// The messages hub (rooms) and the notifications hub (users).
#[derive(Debug, Clone)]
pub struct RealtimeEngine {
    /// Chat messages, fanned out by room.
    pub messages: Hub,
    /// Notifications, fanned out by user.
    pub notifications: Hub,
}

impl RealtimeEngine {
    /// Start both registry actors.
    pub fn new(config: RealtimeConfig) -> Self {
        let messages = Hub::spawn(HubVariant::Rooms, config.clone());
        let notifications = Hub::spawn(HubVariant::Users, config);

        info!("Real-time engine initialized");

        Self {
            messages,
            notifications,
        }
    }

    /// Look up a hub by its route name (`messages` or `notifications`).
    pub fn hub(&self, name: &str) -> Option<&Hub> {
        match name {
            "messages" => Some(&self.messages),
            "notifications" => Some(&self.notifications),
            _ => None,
        }
    }

    /// Registry counts and metrics for both hubs.
    pub async fn stats(&self) -> AppResult<EngineStats> {
        Ok(EngineStats {
            messages: HubStats::collect(&self.messages).await?,
            notifications: HubStats::collect(&self.notifications).await?,
        })
    }

    /// Close every connection on both hubs and stop their actors.
    pub async fn shutdown(&self) {
        info!("Shutting down real-time engine");

        let (messages, notifications) =
            tokio::join!(self.messages.shutdown(), self.notifications.shutdown());

        info!(
            messages_closed = messages,
            notifications_closed = notifications,
            "Real-time engine shut down"
        );
    }
}

/// Stats of one hub.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubStats {
    /// Live connections
    pub connections: usize,
    /// Users online
    pub users: usize,
    /// Rooms with subscribers
    pub rooms: usize,
    /// Counters
    pub metrics: MetricsSnapshot,
}

impl HubStats {
    async fn collect(hub: &Hub) -> AppResult<Self> {
        let snapshot = hub.snapshot().await?;
        Ok(Self {
            connections: snapshot.connection_count,
            users: snapshot.user_count,
            rooms: snapshot.room_count,
            metrics: hub.metrics_snapshot(),
        })
    }
}

/// Stats of both hubs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineStats {
    /// Messages hub
    pub messages: HubStats,
    /// Notifications hub
    pub notifications: HubStats,
}
