//! Hub metrics.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::fanout::FanoutReport;

/// Per-hub counters, shared between the registry actor and the sessions.
#[derive(Debug)]
pub struct HubMetrics {
    /// Total connections ever registered
    pub connections_total: AtomicU64,
    /// Connections currently registered
    pub connections_active: AtomicU64,
    /// Total subscriptions added
    pub subscriptions_total: AtomicU64,
    /// Publish calls handled
    pub publishes: AtomicU64,
    /// Payloads placed on an outbound queue
    pub payloads_delivered: AtomicU64,
    /// Payloads discarded because a queue was full
    pub payloads_dropped: AtomicU64,
    /// Data frames read from peers
    pub frames_received: AtomicU64,
    /// Frames that were not a valid control message
    pub control_frames_rejected: AtomicU64,
}

impl HubMetrics {
    /// Create new zeroed metrics
    pub fn new() -> Self {
        Self {
            connections_total: AtomicU64::new(0),
            connections_active: AtomicU64::new(0),
            subscriptions_total: AtomicU64::new(0),
            publishes: AtomicU64::new(0),
            payloads_delivered: AtomicU64::new(0),
            payloads_dropped: AtomicU64::new(0),
            frames_received: AtomicU64::new(0),
            control_frames_rejected: AtomicU64::new(0),
        }
    }

    /// Record a new connection
    pub fn record_connect(&self) {
        self.connections_total.fetch_add(1, Ordering::Relaxed);
        self.connections_active.fetch_add(1, Ordering::Relaxed);
    }

    /// Record `count` disconnections
    pub fn record_disconnect(&self, count: u64) {
        self.connections_active.fetch_sub(count, Ordering::Relaxed);
    }

    /// Record a subscription that changed membership
    pub fn record_subscribe(&self) {
        self.subscriptions_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Fold one fanout report into the counters
    pub fn record_publish(&self, report: &FanoutReport) {
        self.publishes.fetch_add(1, Ordering::Relaxed);
        self.payloads_delivered
            .fetch_add(report.delivered as u64, Ordering::Relaxed);
        self.payloads_dropped
            .fetch_add(report.dropped as u64, Ordering::Relaxed);
    }

    /// Record an inbound data frame
    pub fn record_frame(&self) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a frame that failed control decoding
    pub fn record_rejected(&self) {
        self.control_frames_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            connections_total: self.connections_total.load(Ordering::Relaxed),
            connections_active: self.connections_active.load(Ordering::Relaxed),
            subscriptions_total: self.subscriptions_total.load(Ordering::Relaxed),
            publishes: self.publishes.load(Ordering::Relaxed),
            payloads_delivered: self.payloads_delivered.load(Ordering::Relaxed),
            payloads_dropped: self.payloads_dropped.load(Ordering::Relaxed),
            frames_received: self.frames_received.load(Ordering::Relaxed),
            control_frames_rejected: self.control_frames_rejected.load(Ordering::Relaxed),
        }
    }
}

impl Default for HubMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable metrics snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Total connections ever registered
    pub connections_total: u64,
    /// Connections currently registered
    pub connections_active: u64,
    /// Total subscriptions added
    pub subscriptions_total: u64,
    /// Publish calls handled
    pub publishes: u64,
    /// Payloads placed on an outbound queue
    pub payloads_delivered: u64,
    /// Payloads discarded because a queue was full
    pub payloads_dropped: u64,
    /// Data frames read from peers
    pub frames_received: u64,
    /// Frames that were not a valid control message
    pub control_frames_rejected: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_folds_report() {
        let metrics = HubMetrics::new();
        metrics.record_publish(&FanoutReport {
            matched: 3,
            delivered: 2,
            dropped: 1,
            stale: Vec::new(),
        });

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.publishes, 1);
        assert_eq!(snapshot.payloads_delivered, 2);
        assert_eq!(snapshot.payloads_dropped, 1);
    }

    #[test]
    fn test_connect_disconnect() {
        let metrics = HubMetrics::new();
        metrics.record_connect();
        metrics.record_connect();
        metrics.record_disconnect(1);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.connections_total, 2);
        assert_eq!(snapshot.connections_active, 1);
    }
}
