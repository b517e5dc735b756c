//! Reader loop: reads peer frames under a sliding deadline and applies
//! control messages.

use std::fmt::Display;

use futures::{Stream, StreamExt};
use tokio::time::timeout_at;
use tracing::{debug, warn};

use chathub_core::types::id::ConnectionId;

use crate::hub::Hub;
use crate::message::control::ControlMessage;
use crate::message::validator::{validate_inbound, validate_not_blank};

use super::frame::Frame;
use super::keepalive::KeepaliveConfig;

/// Why the reader loop stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReaderExit {
    /// The peer sent a close frame.
    PeerClosed,
    /// The transport stream ended without a close frame.
    StreamEnded,
    /// The transport reported an error.
    ReadFailed(String),
    /// Nothing arrived within `pong_wait` of the last pong.
    DeadlineExceeded,
    /// The peer sent a data frame over the size limit.
    MessageTooLarge(usize),
}

/// Read frames from `stream` until a fatal condition.
///
/// Pongs slide the read deadline. Data frames are decoded as control
/// messages and applied to `hub`; malformed ones are logged and skipped.
pub async fn run_reader<St, E>(
    mut stream: St,
    hub: &Hub,
    conn_id: ConnectionId,
    keepalive: KeepaliveConfig,
    max_message_size: usize,
) -> ReaderExit
where
    St: Stream<Item = Result<Frame, E>> + Unpin,
    E: Display,
{
    let mut deadline = keepalive.read_deadline();

    let exit = loop {
        let next = match timeout_at(deadline.instant(), stream.next()).await {
            Ok(next) => next,
            Err(_) => break ReaderExit::DeadlineExceeded,
        };

        let frame = match next {
            Some(Ok(frame)) => frame,
            Some(Err(e)) => break ReaderExit::ReadFailed(e.to_string()),
            None => break ReaderExit::StreamEnded,
        };

        match frame {
            Frame::Pong(_) => deadline.reset(),
            // Answered by the transport.
            Frame::Ping(_) => {}
            Frame::Close => break ReaderExit::PeerClosed,
            data => {
                let len = data.len();
                if validate_inbound(len, max_message_size).is_err() {
                    break ReaderExit::MessageTooLarge(len);
                }
                hub.metrics().record_frame();

                let (Frame::Text(body) | Frame::Binary(body)) = data else {
                    continue;
                };
                let Ok(text) = std::str::from_utf8(&body) else {
                    hub.metrics().record_rejected();
                    warn!(conn_id = %conn_id, "Ignoring non-UTF-8 data frame");
                    continue;
                };
                apply_control(hub, conn_id, text).await;
            }
        }
    };

    debug!(conn_id = %conn_id, exit = ?exit, "Reader loop ended");
    exit
}

async fn apply_control(hub: &Hub, conn_id: ConnectionId, raw: &str) {
    let message = match validate_not_blank(raw).and_then(|()| ControlMessage::decode(raw)) {
        Ok(message) => message,
        Err(e) => {
            hub.metrics().record_rejected();
            warn!(conn_id = %conn_id, error = %e, "Ignoring malformed control frame");
            return;
        }
    };

    let result = match message {
        ControlMessage::Subscribe { room_id } => hub.subscribe(conn_id, room_id).await,
        ControlMessage::Unsubscribe { room_id } => hub.unsubscribe(conn_id, room_id).await,
        ControlMessage::Unknown { kind } => {
            hub.metrics().record_rejected();
            warn!(conn_id = %conn_id, kind = %kind, "Ignoring unknown control frame type");
            return;
        }
    };

    if let Err(e) = result {
        debug!(conn_id = %conn_id, error = %e, "Control frame not applied");
    }
}
