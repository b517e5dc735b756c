//! Outbound event shapes.
//!
//! These are the JSON bodies upstream services publish through the hub. The
//! hub itself treats payloads as opaque bytes; the types exist so in-process
//! publishers can go through [`crate::hub::Hub::publish_event`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use chathub_core::types::id::{RoomId, UserId};

/// Public profile fields embedded in a chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    /// User ID
    pub id: UserId,
    /// Handle
    pub username: String,
    /// Display name
    pub name: String,
    /// Avatar URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_picture_url: Option<String>,
}

/// An attachment on a chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    /// Attachment ID
    pub id: u64,
    /// Where to fetch it
    pub url: String,
    /// `image`, `video`, ...
    #[serde(rename = "type")]
    pub kind: String,
}

/// A full chat message, pushed to every subscriber of its room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessageEvent {
    /// Message ID
    pub id: u64,
    /// Room the message belongs to
    pub chat_id: RoomId,
    /// Author
    pub sender_id: UserId,
    /// Author profile, when the publisher resolved it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_summary: Option<UserSummary>,
    /// Text body
    pub content: String,
    /// `text`, `media`, ...
    #[serde(rename = "type")]
    pub kind: String,
    /// Attachments
    #[serde(default)]
    pub media_items: Vec<MediaItem>,
    /// Send time
    pub sent_at: DateTime<Utc>,
    /// Soft-deletion flag
    #[serde(default)]
    pub is_deleted: bool,
}

/// Lightweight update envelope (deletions, edits, read receipts).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageUpdateEvent {
    /// e.g. `message_deleted`
    #[serde(rename = "type")]
    pub kind: String,
    /// Room
    pub chat_id: RoomId,
    /// Affected message
    pub message_id: u64,
    /// Who caused the update
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<UserId>,
}

impl MessageUpdateEvent {
    /// Deletion notice for `message_id` in `chat_id`.
    pub fn deleted(chat_id: RoomId, message_id: u64, actor_id: Option<UserId>) -> Self {
        Self {
            kind: "message_deleted".to_string(),
            chat_id,
            message_id,
            actor_id,
        }
    }
}

/// A user notification record, pushed to every connection of its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEvent {
    /// Notification ID
    pub id: u64,
    /// Recipient
    pub user_id: UserId,
    /// `like`, `follow`, `mention`, ...
    #[serde(rename = "type")]
    pub kind: String,
    /// Human-readable text
    pub message: String,
    /// Read flag
    #[serde(default)]
    pub is_read: bool,
    /// Thread, user or message the notification points at
    pub entity_id: String,
    /// Who triggered it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<UserId>,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl NotificationEvent {
    /// Fresh unread notification created now.
    pub fn new(
        id: u64,
        user_id: UserId,
        kind: impl Into<String>,
        message: impl Into<String>,
        entity_id: impl Into<String>,
        actor_id: Option<UserId>,
    ) -> Self {
        Self {
            id,
            user_id,
            kind: kind.into(),
            message: message.into(),
            is_read: false,
            entity_id: entity_id.into(),
            actor_id,
            created_at: Utc::now(),
        }
    }
}
