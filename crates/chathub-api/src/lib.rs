//! # chathub-api
//!
//! HTTP layer for ChatHub built on Axum.
//!
//! Provides the two WebSocket endpoints, the internal publish endpoint used
//! by upstream services, health/stats routes, extractors, and error mapping.

pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod router;
pub mod state;

pub use router::build_router;
pub use state::AppState;
