//! The registry actor.
//!
//! One task owns the [`RegistryState`] and applies commands in arrival
//! order, so register, unregister, subscribe, unsubscribe and publish are
//! atomic with respect to each other without a lock. No command awaits.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::hub::HubVariant;
use crate::metrics::HubMetrics;

use super::command::Command;
use super::state::{RegistryState, SubscriptionChange};

/// Single owner of one hub's registry.
#[derive(Debug)]
pub struct RegistryActor {
    variant: HubVariant,
    state: RegistryState,
    commands: mpsc::UnboundedReceiver<Command>,
    metrics: Arc<HubMetrics>,
}

impl RegistryActor {
    pub(crate) fn new(
        variant: HubVariant,
        commands: mpsc::UnboundedReceiver<Command>,
        metrics: Arc<HubMetrics>,
    ) -> Self {
        Self {
            variant,
            state: RegistryState::new(),
            commands,
            metrics,
        }
    }

    /// Run the actor on its own task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Process commands until shutdown or until every hub handle is gone.
    pub async fn run(mut self) {
        info!(hub = %self.variant, "Registry actor started");

        while let Some(command) = self.commands.recv().await {
            if !self.handle(command) {
                break;
            }
        }

        // Commands still buffered are dropped with the receiver; their
        // callers see the hub as gone.
        self.commands.close();
        let remaining = self.state.drain().len();
        if remaining > 0 {
            self.metrics.record_disconnect(remaining as u64);
        }

        info!(hub = %self.variant, "Registry actor stopped");
    }

    /// Apply one command. Returns `false` once the actor should stop.
    fn handle(&mut self, command: Command) -> bool {
        match command {
            Command::Register { handle, reply } => {
                debug!(
                    hub = %self.variant,
                    conn_id = %handle.id,
                    user_id = %handle.user_id,
                    "Connection registered"
                );
                self.state.register(handle);
                self.metrics.record_connect();
                let _ = reply.send(());
            }
            Command::Unregister { id, reply } => {
                let removed = self.state.unregister(id);
                let found = removed.is_some();
                if let Some(handle) = removed {
                    self.metrics.record_disconnect(1);
                    debug!(
                        hub = %self.variant,
                        conn_id = %id,
                        user_id = %handle.user_id,
                        "Connection unregistered"
                    );
                    // Last sender of the outbound queue goes here.
                    drop(handle);
                }
                if let Some(reply) = reply {
                    let _ = reply.send(found);
                }
            }
            Command::Subscribe { id, room_id, reply } => {
                let change = if self.variant.accepts_control_frames() {
                    self.state.subscribe(id, room_id)
                } else {
                    SubscriptionChange::Unsupported
                };
                match change {
                    SubscriptionChange::Added => {
                        self.metrics.record_subscribe();
                        debug!(conn_id = %id, room_id = %room_id, "Subscribed to room");
                    }
                    SubscriptionChange::Unsupported => {
                        warn!(hub = %self.variant, conn_id = %id, "Subscribe rejected on user-scoped hub");
                    }
                    _ => {}
                }
                let _ = reply.send(change);
            }
            Command::Unsubscribe { id, room_id, reply } => {
                let change = if self.variant.accepts_control_frames() {
                    self.state.unsubscribe(id, room_id)
                } else {
                    SubscriptionChange::Unsupported
                };
                if change == SubscriptionChange::Removed {
                    debug!(conn_id = %id, room_id = %room_id, "Unsubscribed from room");
                }
                let _ = reply.send(change);
            }
            Command::Publish {
                scope,
                payload,
                reply,
            } => {
                let report = self.state.publish(scope, &payload);
                if !report.stale.is_empty() {
                    self.metrics.record_disconnect(report.stale.len() as u64);
                    debug!(
                        hub = %self.variant,
                        scope = %scope,
                        reaped = report.stale.len(),
                        "Reaped connections with closed writers"
                    );
                }
                if report.is_empty() {
                    debug!(hub = %self.variant, scope = %scope, "No recipients for publish");
                }
                self.metrics.record_publish(&report);
                let _ = reply.send(report);
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(self.state.snapshot());
            }
            Command::Shutdown { reply } => {
                let closed = self.state.drain().len();
                self.metrics.record_disconnect(closed as u64);
                info!(hub = %self.variant, closed, "Registry drained for shutdown");
                self.commands.close();
                let _ = reply.send(closed);
                return false;
            }
        }

        debug_assert!(
            self.state.check_invariants().is_ok(),
            "registry invariants violated"
        );
        true
    }
}
