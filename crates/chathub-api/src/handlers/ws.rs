//! WebSocket upgrade handlers.

use axum::extract::ws::{Message, Utf8Bytes, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt, future};

use chathub_core::types::id::UserId;
use chathub_realtime::{Frame, Hub, run_session};

use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /ws/messages?token={jwt}
pub async fn messages_ws(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ws: WebSocketUpgrade,
) -> Response {
    upgrade(&state, state.realtime.messages.clone(), user_id, ws)
}

/// GET /ws/notifications?token={jwt}
pub async fn notifications_ws(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ws: WebSocketUpgrade,
) -> Response {
    upgrade(&state, state.realtime.notifications.clone(), user_id, ws)
}

fn upgrade(state: &AppState, hub: Hub, user_id: UserId, ws: WebSocketUpgrade) -> Response {
    let sessions = state.sessions.clone();
    ws.max_message_size(hub.config().max_message_size)
        .on_upgrade(move |socket| sessions.track_future(serve_socket(hub, user_id, socket)))
}

async fn serve_socket(hub: Hub, user_id: UserId, socket: WebSocket) {
    let (ws_tx, ws_rx) = socket.split();

    let sink = ws_tx.with(|frame: Frame| future::ready(Ok::<_, axum::Error>(into_message(frame))));
    let stream = ws_rx.map(|result| result.map(from_message));

    run_session(hub, user_id, sink, stream).await;
}

fn into_message(frame: Frame) -> Message {
    match frame {
        Frame::Text(data) => match Utf8Bytes::try_from(data.clone()) {
            Ok(text) => Message::Text(text),
            Err(_) => Message::Binary(data),
        },
        Frame::Binary(data) => Message::Binary(data),
        Frame::Ping(data) => Message::Ping(data),
        Frame::Pong(data) => Message::Pong(data),
        Frame::Close => Message::Close(None),
    }
}

fn from_message(message: Message) -> Frame {
    match message {
        Message::Text(text) => Frame::Text(text.into()),
        Message::Binary(data) => Frame::Binary(data),
        Message::Ping(data) => Frame::Ping(data),
        Message::Pong(data) => Frame::Pong(data),
        Message::Close(_) => Frame::Close,
    }
}
