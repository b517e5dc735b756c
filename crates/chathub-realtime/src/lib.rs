//! # chathub-realtime
//!
//! Real-time delivery hub for ChatHub. Provides:
//!
//! - A single-owner registry actor indexing live connections by id, user and room
//! - Non-blocking fanout of pre-serialized payloads with a per-connection drop policy
//! - Reader/writer loops per connection with ping/read-deadline keepalive
//! - Control-frame decoding for room subscriptions
//! - Outbound event shapes (chat messages, message updates, notifications)
//!
//! The hub is volatile: it never persists anything and delivers at most once.

pub mod connection;
pub mod fanout;
pub mod hub;
pub mod message;
pub mod metrics;
pub mod registry;
pub mod server;

pub use connection::frame::Frame;
pub use connection::reader::ReaderExit;
pub use connection::session::{SessionOutcome, run_session};
pub use connection::writer::WriterExit;
pub use fanout::{FanoutReport, Payload, Scope};
pub use hub::{Hub, HubVariant, Registration};
pub use registry::{RegistrySnapshot, SubscriptionChange};
pub use server::{EngineStats, HubStats, RealtimeEngine};
