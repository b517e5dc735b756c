//! Fanout engine: pushes one payload onto many outbound queues.

use serde::{Deserialize, Serialize};
use tracing::warn;

use chathub_core::types::id::ConnectionId;

use crate::connection::handle::{ConnectionHandle, Delivery};

use super::scope::Payload;

/// Outcome of one publish call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FanoutReport {
    /// Connections the scope resolved to.
    pub matched: usize,
    /// Payloads placed on a queue.
    pub delivered: usize,
    /// Payloads discarded because the recipient's queue was full.
    pub dropped: usize,
    /// Connections whose writer had already gone; the registry reaps them.
    #[serde(skip)]
    pub stale: Vec<ConnectionId>,
}

impl FanoutReport {
    /// True when nobody matched the scope.
    pub fn is_empty(&self) -> bool {
        self.matched == 0
    }
}

/// Attempt a non-blocking enqueue of `payload` on every target.
///
/// A full queue only affects its own connection: the payload is dropped for
/// that recipient and the loop moves on. Never waits.
pub fn fan_out<'a>(
    targets: impl IntoIterator<Item = &'a ConnectionHandle>,
    payload: &Payload,
) -> FanoutReport {
    let mut report = FanoutReport::default();

    for handle in targets {
        report.matched += 1;
        match handle.try_enqueue(payload) {
            Delivery::Enqueued => report.delivered += 1,
            Delivery::Dropped => {
                report.dropped += 1;
                warn!(
                    conn_id = %handle.id,
                    user_id = %handle.user_id,
                    "Outbound queue full, dropping payload"
                );
            }
            Delivery::Closed => report.stale.push(handle.id),
        }
    }

    report
}
