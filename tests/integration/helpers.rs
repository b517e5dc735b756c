//! Shared helpers: a real server on an ephemeral port plus WebSocket clients.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use futures::StreamExt;
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use chathub_api::{AppState, build_router};
use chathub_auth::{JwtDecoder, JwtEncoder};
use chathub_core::config::AppConfig;
use chathub_core::types::id::UserId;
use chathub_realtime::{Hub, RealtimeEngine};

/// Client side of a WebSocket connection.
pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Internal token configured on every test server.
pub const INTERNAL_TOKEN: &str = "integration-internal-token";

/// A running server.
pub struct TestServer {
    /// Listening address
    pub addr: SocketAddr,
    /// Shared state (same hubs the listener serves)
    pub state: AppState,
    /// Router over the same state, for in-process HTTP requests
    pub router: Router,
    encoder: JwtEncoder,
    shutdown: CancellationToken,
}

impl TestServer {
    /// Start a server with test defaults.
    pub async fn start() -> Self {
        Self::start_with(|_| {}).await
    }

    /// Start a server after adjusting the config.
    pub async fn start_with(adjust: impl FnOnce(&mut AppConfig)) -> Self {
        let mut config = AppConfig::default();
        config.auth.jwt_secret = "integration-secret".to_string();
        config.auth.internal_token = Some(INTERNAL_TOKEN.to_string());
        adjust(&mut config);

        let encoder = JwtEncoder::new(&config.auth);
        let tokens = Arc::new(JwtDecoder::new(&config.auth));
        let realtime = RealtimeEngine::new(config.realtime.clone());
        let state = AppState::new(config, realtime, tokens);
        let router = build_router(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("local addr");

        let shutdown = CancellationToken::new();
        let app = router.clone();
        let cancelled = shutdown.clone().cancelled_owned();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(cancelled)
                .await
                .expect("server failed");
        });

        Self {
            addr,
            state,
            router,
            encoder,
            shutdown,
        }
    }

    /// Mint a valid access token for `user_id`.
    pub fn token(&self, user_id: u64) -> String {
        self.encoder
            .issue(UserId(user_id), chrono::Duration::minutes(5))
            .expect("Failed to issue token")
    }

    /// `ws://` URL for `path`.
    pub fn ws_url(&self, path: &str) -> String {
        format!("ws://{}{}", self.addr, path)
    }

    /// Open an authenticated WebSocket on `path`.
    pub async fn connect(&self, path: &str, user_id: u64) -> WsClient {
        let url = format!("{}?token={}", self.ws_url(path), self.token(user_id));
        let (client, _) = connect_async(url).await.expect("WebSocket handshake failed");
        client
    }

    /// The messages hub.
    pub fn messages(&self) -> &Hub {
        &self.state.realtime.messages
    }

    /// The notifications hub.
    pub fn notifications(&self) -> &Hub {
        &self.state.realtime.notifications
    }

    /// POST `body` to `uri` through the router.
    pub async fn post(&self, uri: &str, body: &str, internal_token: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::post(uri);
        if let Some(token) = internal_token {
            builder = builder.header("x-internal-token", token);
        }
        let request = builder.body(Body::from(body.to_string())).unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Poll until the hub reports the expected connection and room counts.
pub async fn wait_for(hub: &Hub, connections: usize, rooms: usize) {
    for _ in 0..500 {
        let snapshot = hub.snapshot().await.expect("hub running");
        if snapshot.connection_count == connections && snapshot.room_count == rooms {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("hub never reached {connections} connections / {rooms} rooms");
}

/// Next text frame, skipping keepalive frames.
pub async fn next_text(client: &mut WsClient) -> String {
    loop {
        let message = tokio::time::timeout(Duration::from_secs(5), client.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("stream ended")
            .expect("read failed");
        match message {
            Message::Text(text) => return text.as_str().to_owned(),
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("expected text frame, got {other:?}"),
        }
    }
}

/// Assert that no data frame arrives within `wait`.
pub async fn expect_silence(client: &mut WsClient, wait: Duration) {
    if let Ok(Some(Ok(message))) = tokio::time::timeout(wait, client.next()).await {
        assert!(
            matches!(message, Message::Ping(_) | Message::Pong(_)),
            "unexpected frame {message:?}"
        );
    }
}
