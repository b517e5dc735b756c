//! Messages crossing the hub: inbound control frames and outbound event shapes.

pub mod control;
pub mod events;
pub mod serializer;
pub mod validator;

pub use control::ControlMessage;
pub use events::{ChatMessageEvent, MediaItem, MessageUpdateEvent, NotificationEvent, UserSummary};
