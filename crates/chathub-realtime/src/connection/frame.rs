//! Transport-neutral WebSocket frames.
//!
//! The session loops speak `Frame`; the HTTP layer converts to and from its
//! own socket message type at the edge.

use bytes::Bytes;

/// A single frame on the duplex channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// UTF-8 data frame. Shares the fanout payload buffer.
    Text(Bytes),
    /// Binary data frame
    Binary(Bytes),
    /// Keepalive probe
    Ping(Bytes),
    /// Keepalive answer
    Pong(Bytes),
    /// Close handshake
    Close,
}

impl Frame {
    /// A text frame from an owned string.
    pub fn text(text: impl Into<String>) -> Self {
        Frame::Text(Bytes::from(text.into()))
    }

    /// Wrap an outbound payload. Valid UTF-8 goes out as text without
    /// copying the buffer.
    pub fn from_payload(payload: Bytes) -> Self {
        if std::str::from_utf8(&payload).is_ok() {
            Frame::Text(payload)
        } else {
            Frame::Binary(payload)
        }
    }

    /// Size of the frame body in bytes.
    pub fn len(&self) -> usize {
        match self {
            Frame::Text(data) | Frame::Binary(data) | Frame::Ping(data) | Frame::Pong(data) => {
                data.len()
            }
            Frame::Close => 0,
        }
    }

    /// True for frames without a body.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
