//! Inbound control frames.
//!
//! Clients of the messages hub send `{"type":"subscribe_chat","chat_id":N}`
//! and `{"type":"unsubscribe_chat","chat_id":N}`. Anything else with a
//! `type` is decoded as [`ControlMessage::Unknown`] and ignored by the reader.

use serde::Deserialize;

use chathub_core::error::AppError;
use chathub_core::types::id::RoomId;

/// A decoded control frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlMessage {
    /// Join a chat room.
    Subscribe {
        /// Room to join.
        room_id: RoomId,
    },
    /// Leave a chat room.
    Unsubscribe {
        /// Room to leave.
        room_id: RoomId,
    },
    /// Well-formed frame with an unrecognized `type`.
    Unknown {
        /// The `type` tag as sent.
        kind: String,
    },
}

#[derive(Debug, Deserialize)]
struct RawControl {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    chat_id: Option<u64>,
}

impl ControlMessage {
    /// Decode a control frame from raw text.
    pub fn decode(raw: &str) -> Result<Self, AppError> {
        let frame: RawControl = serde_json::from_str(raw)?;

        match frame.kind.as_str() {
            "subscribe_chat" => Ok(ControlMessage::Subscribe {
                room_id: required_room(frame.chat_id)?,
            }),
            "unsubscribe_chat" => Ok(ControlMessage::Unsubscribe {
                room_id: required_room(frame.chat_id)?,
            }),
            _ => Ok(ControlMessage::Unknown { kind: frame.kind }),
        }
    }
}

fn required_room(chat_id: Option<u64>) -> Result<RoomId, AppError> {
    match chat_id {
        Some(id) if id > 0 => Ok(RoomId(id)),
        Some(_) => Err(AppError::validation("chat_id must be positive")),
        None => Err(AppError::validation("chat_id is required")),
    }
}
