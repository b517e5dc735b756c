//! Per-connection machinery: registry handle, transport frames, keepalive,
//! lifecycle state, and the reader/writer loops driven by a session.

pub mod frame;
pub mod handle;
pub mod keepalive;
pub mod lifecycle;
pub mod reader;
pub mod session;
pub mod writer;

pub use frame::Frame;
pub use handle::{ConnectionHandle, ConnectionInfo, Delivery};
pub use keepalive::KeepaliveConfig;
pub use lifecycle::{ConnectionState, Lifecycle};
