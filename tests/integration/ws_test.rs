//! Integration tests for WebSocket connection and delivery.

mod helpers;

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};

use chathub_core::types::id::{RoomId, UserId};
use chathub_realtime::Scope;
use chathub_realtime::message::{ChatMessageEvent, MessageUpdateEvent, NotificationEvent};

use helpers::{TestServer, expect_silence, next_text, wait_for};

fn assert_rejected(result: Result<impl std::fmt::Debug, WsError>, expected: u16) {
    match result {
        Err(WsError::Http(response)) => assert_eq!(response.status().as_u16(), expected),
        other => panic!("expected HTTP {expected}, got {other:?}"),
    }
}

#[tokio::test]
async fn test_ws_upgrade_without_token() {
    let server = TestServer::start().await;

    let result = connect_async(server.ws_url("/ws/messages")).await;

    assert_rejected(result, 401);
    wait_for(server.messages(), 0, 0).await;
}

#[tokio::test]
async fn test_ws_upgrade_with_invalid_token() {
    let server = TestServer::start().await;

    let result = connect_async(format!("{}?token=garbage", server.ws_url("/ws/notifications"))).await;

    assert_rejected(result, 401);
}

#[tokio::test]
async fn test_ws_bearer_header_accepted() {
    let server = TestServer::start().await;

    let mut request = server.ws_url("/ws/notifications").into_client_request().unwrap();
    request.headers_mut().insert(
        "Authorization",
        format!("Bearer {}", server.token(9)).parse().unwrap(),
    );
    let (_client, _) = connect_async(request).await.unwrap();

    wait_for(server.notifications(), 1, 0).await;
    let snapshot = server.notifications().snapshot().await.unwrap();
    assert_eq!(snapshot.connections[0].user_id, UserId(9));
}

#[tokio::test]
async fn test_ws_percent_encoded_query_token_accepted() {
    let server = TestServer::start().await;

    let encoded = server.token(4).replace('.', "%2E").replace('-', "%2D");
    let url = format!("{}?token={}", server.ws_url("/ws/messages"), encoded);
    let (_client, _) = connect_async(url).await.unwrap();

    wait_for(server.messages(), 1, 0).await;
    let snapshot = server.messages().snapshot().await.unwrap();
    assert_eq!(snapshot.connections[0].user_id, UserId(4));
}

#[tokio::test]
async fn test_room_fanout_reaches_only_subscribers() {
    let server = TestServer::start().await;
    let mut member = server.connect("/ws/messages", 1).await;
    let mut outsider = server.connect("/ws/messages", 2).await;
    wait_for(server.messages(), 2, 0).await;

    member
        .send(Message::Text(r#"{"type":"subscribe_chat","chat_id":7}"#.into()))
        .await
        .unwrap();
    wait_for(server.messages(), 2, 1).await;

    let event: ChatMessageEvent = serde_json::from_value(serde_json::json!({
        "id": 100,
        "chat_id": 7,
        "sender_id": 2,
        "content": "hello room",
        "type": "text",
        "sent_at": "2024-05-01T12:00:00Z"
    }))
    .unwrap();
    let report = server
        .messages()
        .publish_event(Scope::ToRoom(RoomId(7)), &event)
        .await
        .unwrap();
    assert_eq!(report.delivered, 1);

    let received: ChatMessageEvent = serde_json::from_str(&next_text(&mut member).await).unwrap();
    assert_eq!(received, event);
    expect_silence(&mut outsider, Duration::from_millis(200)).await;

    let update = MessageUpdateEvent::deleted(RoomId(7), 100, Some(UserId(2)));
    server
        .messages()
        .publish_event(Scope::ToRoom(RoomId(7)), &update)
        .await
        .unwrap();
    let received: serde_json::Value = serde_json::from_str(&next_text(&mut member).await).unwrap();
    assert_eq!(received["type"], "message_deleted");
    assert_eq!(received["message_id"], 100);

    member
        .send(Message::Text(r#"{"type":"unsubscribe_chat","chat_id":7}"#.into()))
        .await
        .unwrap();
    wait_for(server.messages(), 2, 0).await;
}

#[tokio::test]
async fn test_notification_reaches_every_device() {
    let server = TestServer::start().await;
    let mut phone = server.connect("/ws/notifications", 42).await;
    let mut laptop = server.connect("/ws/notifications", 42).await;
    let mut stranger = server.connect("/ws/notifications", 43).await;
    wait_for(server.notifications(), 3, 0).await;

    let event = NotificationEvent::new(5, UserId(42), "mention", "you were mentioned", "12", Some(UserId(43)));
    let report = server
        .notifications()
        .publish_event(Scope::ToUser(UserId(42)), &event)
        .await
        .unwrap();
    assert_eq!(report.delivered, 2);

    let a = next_text(&mut phone).await;
    let b = next_text(&mut laptop).await;
    assert_eq!(a, b);
    assert_eq!(serde_json::from_str::<NotificationEvent>(&a).unwrap(), event);
    expect_silence(&mut stranger, Duration::from_millis(200)).await;
}

#[tokio::test]
async fn test_malformed_frames_keep_connection_open() {
    let server = TestServer::start().await;
    let mut client = server.connect("/ws/messages", 1).await;
    wait_for(server.messages(), 1, 0).await;

    client.send(Message::Text("not json".into())).await.unwrap();
    client
        .send(Message::Text(r#"{"type":"typing_indicator","chat_id":1}"#.into()))
        .await
        .unwrap();
    client
        .send(Message::Text(r#"{"type":"subscribe_chat","chat_id":3}"#.into()))
        .await
        .unwrap();
    wait_for(server.messages(), 1, 1).await;

    assert_eq!(server.messages().metrics_snapshot().control_frames_rejected, 2);
}

#[tokio::test]
async fn test_oversized_frame_closes_connection() {
    let server = TestServer::start_with(|config| config.realtime.max_message_size = 128).await;
    let mut client = server.connect("/ws/messages", 1).await;
    wait_for(server.messages(), 1, 0).await;

    client.send(Message::Text("x".repeat(1024).into())).await.unwrap();

    wait_for(server.messages(), 0, 0).await;
    // The server tears the socket down; the client sees a close or an error.
    let next = tokio::time::timeout(Duration::from_secs(5), client.next()).await.unwrap();
    assert!(!matches!(next, Some(Ok(Message::Text(_)))));
}

#[tokio::test]
async fn test_client_close_unregisters() {
    let server = TestServer::start().await;
    let mut client = server.connect("/ws/messages", 1).await;
    client
        .send(Message::Text(r#"{"type":"subscribe_chat","chat_id":9}"#.into()))
        .await
        .unwrap();
    wait_for(server.messages(), 1, 1).await;

    client.close(None).await.unwrap();

    wait_for(server.messages(), 0, 0).await;
    assert_eq!(server.messages().metrics_snapshot().connections_active, 0);
}

#[tokio::test]
async fn test_engine_shutdown_sends_close_frame() {
    let server = TestServer::start().await;
    let mut client = server.connect("/ws/notifications", 1).await;
    wait_for(server.notifications(), 1, 0).await;

    server.state.realtime.shutdown().await;

    let message = loop {
        let next = tokio::time::timeout(Duration::from_secs(5), client.next())
            .await
            .expect("timed out waiting for close")
            .expect("stream ended")
            .expect("read failed");
        if !matches!(next, Message::Ping(_) | Message::Pong(_)) {
            break next;
        }
    };
    assert!(matches!(message, Message::Close(_)));
}
