//! Integration tests for the internal publish endpoint.

mod helpers;

use std::time::Duration;

use axum::http::StatusCode;
use futures::SinkExt;
use tokio_tungstenite::tungstenite::Message;

use helpers::{INTERNAL_TOKEN, TestServer, expect_silence, next_text, wait_for};

#[tokio::test]
async fn test_http_publish_reaches_user_connections() {
    let server = TestServer::start().await;
    let mut client = server.connect("/ws/notifications", 42).await;
    wait_for(server.notifications(), 1, 0).await;

    let body = r#"{"id":1,"user_id":42,"type":"follow","message":"bob followed you"}"#;
    let (status, report) = server
        .post(
            "/internal/publish/notifications/users/42",
            body,
            Some(INTERNAL_TOKEN),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["matched"], 1);
    assert_eq!(report["delivered"], 1);
    assert_eq!(next_text(&mut client).await, body);
}

#[tokio::test]
async fn test_http_publish_reaches_room_subscribers() {
    let server = TestServer::start().await;
    let mut client = server.connect("/ws/messages", 1).await;
    client
        .send(Message::Text(r#"{"type":"subscribe_chat","chat_id":11}"#.into()))
        .await
        .unwrap();
    wait_for(server.messages(), 1, 1).await;

    let body = r#"{"type":"message_deleted","chat_id":11,"message_id":5}"#;
    let (status, report) = server
        .post("/internal/publish/messages/rooms/11", body, Some(INTERNAL_TOKEN))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["delivered"], 1);
    assert_eq!(next_text(&mut client).await, body);
}

#[tokio::test]
async fn test_http_publish_without_token_is_rejected() {
    let server = TestServer::start().await;
    let mut client = server.connect("/ws/notifications", 42).await;
    wait_for(server.notifications(), 1, 0).await;

    let (status, _) = server
        .post("/internal/publish/notifications/users/42", "{}", None)
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    expect_silence(&mut client, Duration::from_millis(200)).await;
}

#[tokio::test]
async fn test_http_publish_rejects_non_json() {
    let server = TestServer::start().await;
    let mut client = server.connect("/ws/notifications", 42).await;
    wait_for(server.notifications(), 1, 0).await;

    let (status, body) = server
        .post(
            "/internal/publish/notifications/users/42",
            "plain text",
            Some(INTERNAL_TOKEN),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "INVALID_PAYLOAD");
    expect_silence(&mut client, Duration::from_millis(200)).await;
}

#[tokio::test]
async fn test_http_publish_to_offline_user_is_noop() {
    let server = TestServer::start().await;

    let (status, report) = server
        .post(
            "/internal/publish/notifications/users/404",
            "{}",
            Some(INTERNAL_TOKEN),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["matched"], 0);
    assert_eq!(report["delivered"], 0);
}
