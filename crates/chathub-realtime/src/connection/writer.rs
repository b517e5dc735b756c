//! Writer loop: drains the outbound queue to the wire and sends pings.

use std::fmt::Display;
use std::time::Duration;

use bytes::Bytes;
use futures::{Sink, SinkExt};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::debug;

use chathub_core::types::id::ConnectionId;

use crate::fanout::Payload;

use super::frame::Frame;
use super::keepalive::KeepaliveConfig;

/// Why the writer loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterExit {
    /// The registry closed the queue; a close frame was sent.
    QueueClosed,
    /// The transport rejected a write.
    WriteFailed,
    /// A write took longer than `write_wait`.
    WriteTimedOut,
    /// The task was cancelled or panicked.
    Aborted,
}

/// Drain `outbound` into `sink` until the queue closes or a write fails.
///
/// Payloads leave in queue order. Every `ping_interval` a ping goes out on
/// the same sink, so data and keepalive frames never interleave mid-write.
pub async fn run_writer<S>(
    mut sink: S,
    mut outbound: mpsc::Receiver<Payload>,
    keepalive: KeepaliveConfig,
    conn_id: ConnectionId,
) -> WriterExit
where
    S: Sink<Frame> + Unpin,
    S::Error: Display,
{
    let mut ticker = keepalive.ping_ticker();

    let exit = loop {
        tokio::select! {
            next = outbound.recv() => match next {
                Some(payload) => {
                    let frame = Frame::from_payload(payload);
                    if let Err(exit) = write(&mut sink, frame, keepalive.write_wait, conn_id).await {
                        break exit;
                    }
                }
                None => {
                    // Best effort: the peer may already be gone.
                    if write(&mut sink, Frame::Close, keepalive.write_wait, conn_id).await.is_ok() {
                        let _ = timeout(keepalive.write_wait, sink.close()).await;
                    }
                    break WriterExit::QueueClosed;
                }
            },
            _ = ticker.tick() => {
                let ping = Frame::Ping(Bytes::new());
                if let Err(exit) = write(&mut sink, ping, keepalive.write_wait, conn_id).await {
                    break exit;
                }
            }
        }
    };

    debug!(conn_id = %conn_id, exit = ?exit, "Writer loop ended");
    exit
}

async fn write<S>(
    sink: &mut S,
    frame: Frame,
    write_wait: Duration,
    conn_id: ConnectionId,
) -> Result<(), WriterExit>
where
    S: Sink<Frame> + Unpin,
    S::Error: Display,
{
    match timeout(write_wait, sink.send(frame)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => {
            debug!(conn_id = %conn_id, error = %e, "Write failed");
            Err(WriterExit::WriteFailed)
        }
        Err(_) => {
            debug!(conn_id = %conn_id, ?write_wait, "Write timed out");
            Err(WriterExit::WriteTimedOut)
        }
    }
}
