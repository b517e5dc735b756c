//! Requests handled by the registry actor.

use tokio::sync::oneshot;

use chathub_core::types::id::{ConnectionId, RoomId};

use crate::connection::handle::ConnectionHandle;
use crate::fanout::{FanoutReport, Payload, Scope};

use super::state::{RegistrySnapshot, SubscriptionChange};

/// One request to the registry actor. Replies travel on `oneshot` channels;
/// `None` means the caller does not wait.
#[derive(Debug)]
pub(crate) enum Command {
    Register {
        handle: ConnectionHandle,
        reply: oneshot::Sender<()>,
    },
    Unregister {
        id: ConnectionId,
        reply: Option<oneshot::Sender<bool>>,
    },
    Subscribe {
        id: ConnectionId,
        room_id: RoomId,
        reply: oneshot::Sender<SubscriptionChange>,
    },
    Unsubscribe {
        id: ConnectionId,
        room_id: RoomId,
        reply: oneshot::Sender<SubscriptionChange>,
    },
    Publish {
        scope: Scope,
        payload: Payload,
        reply: oneshot::Sender<FanoutReport>,
    },
    Snapshot {
        reply: oneshot::Sender<RegistrySnapshot>,
    },
    Shutdown {
        reply: oneshot::Sender<usize>,
    },
}
