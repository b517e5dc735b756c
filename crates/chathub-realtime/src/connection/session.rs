//! Session driver: ties one authenticated duplex channel to a hub.

use std::fmt::Display;

use futures::{Sink, Stream};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use chathub_core::types::id::{ConnectionId, UserId};

use crate::hub::Hub;

use super::frame::Frame;
use super::keepalive::KeepaliveConfig;
use super::lifecycle::{ConnectionState, Lifecycle};
use super::reader::{ReaderExit, run_reader};
use super::writer::{WriterExit, run_writer};

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOutcome {
    /// Assigned connection ID; `None` if registration failed
    pub conn_id: Option<ConnectionId>,
    /// Set when the reader loop finished first
    pub reader_exit: Option<ReaderExit>,
    /// Writer result; `None` if the writer never started
    pub writer_exit: Option<WriterExit>,
    /// Always `Closed` once the session returns
    pub final_state: ConnectionState,
}

/// Run a connection from registration to teardown.
///
/// The writer runs on its own task; the reader runs on the caller's. When
/// either exits, the registration is released: the connection is
/// unregistered and its queue closed before the session goes on. The writer
/// then flushes a close frame and is awaited for at most twice `write_wait`.
pub async fn run_session<S, St, E>(hub: Hub, user_id: UserId, sink: S, stream: St) -> SessionOutcome
where
    S: Sink<Frame> + Unpin + Send + 'static,
    S::Error: Display + Send + 'static,
    St: Stream<Item = Result<Frame, E>> + Unpin,
    E: Display,
{
    let mut lifecycle = Lifecycle::new();

    let (registration, outbound) = match hub.register(user_id).await {
        Ok(registered) => registered,
        Err(e) => {
            warn!(hub = %hub.variant(), user_id = %user_id, error = %e, "Connection rejected");
            lifecycle.advance(ConnectionState::Closing);
            lifecycle.advance(ConnectionState::Closed);
            return SessionOutcome {
                conn_id: None,
                reader_exit: None,
                writer_exit: None,
                final_state: lifecycle.state(),
            };
        }
    };

    let conn_id = registration.id();
    lifecycle.bind(conn_id);
    lifecycle.advance(ConnectionState::Active);
    info!(hub = %hub.variant(), conn_id = %conn_id, user_id = %user_id, "Connection active");

    let keepalive = KeepaliveConfig::from(hub.config());
    let max_message_size = hub.config().max_message_size;
    let mut writer = tokio::spawn(run_writer(sink, outbound, keepalive, conn_id));

    let (reader_exit, early_writer_exit) = tokio::select! {
        exit = run_reader(stream, &hub, conn_id, keepalive, max_message_size) => (Some(exit), None),
        joined = &mut writer => (None, Some(joined.unwrap_or(WriterExit::Aborted))),
    };

    lifecycle.advance(ConnectionState::Closing);
    if !registration.release().await {
        debug!(hub = %hub.variant(), conn_id = %conn_id, "Connection was already unregistered");
    }

    let writer_exit = match early_writer_exit {
        Some(exit) => exit,
        None => match timeout(keepalive.write_wait * 2, &mut writer).await {
            Ok(joined) => joined.unwrap_or(WriterExit::Aborted),
            Err(_) => {
                writer.abort();
                WriterExit::Aborted
            }
        },
    };

    lifecycle.advance(ConnectionState::Closed);
    info!(
        hub = %hub.variant(),
        conn_id = %conn_id,
        user_id = %user_id,
        reader = ?reader_exit,
        writer = ?writer_exit,
        "Connection closed"
    );

    SessionOutcome {
        conn_id: Some(conn_id),
        reader_exit,
        writer_exit: Some(writer_exit),
        final_state: lifecycle.state(),
    }
}
