//! Application state shared across all handlers.

use std::sync::Arc;

use tokio_util::task::TaskTracker;

use chathub_core::config::AppConfig;
use chathub_core::traits::TokenValidator;
use chathub_realtime::RealtimeEngine;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Both hubs
    pub realtime: RealtimeEngine,
    /// Bearer token validation
    pub tokens: Arc<dyn TokenValidator>,
    /// Live WebSocket sessions, awaited on shutdown
    pub sessions: TaskTracker,
}

impl AppState {
    /// Bundle the shared dependencies.
    pub fn new(config: AppConfig, realtime: RealtimeEngine, tokens: Arc<dyn TokenValidator>) -> Self {
        Self {
            config: Arc::new(config),
            realtime,
            tokens,
            sessions: TaskTracker::new(),
        }
    }
}
