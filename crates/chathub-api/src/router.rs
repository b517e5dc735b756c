//! Route definitions for the ChatHub HTTP surface.

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router.
pub fn build_router(state: AppState) -> Router {
    let max_publish = state.config.server.max_publish_bytes;

    let ws_routes = Router::new()
        .route("/ws/messages", get(handlers::ws::messages_ws))
        .route("/ws/notifications", get(handlers::ws::notifications_ws));

    let api_routes = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/stats", get(handlers::health::stats));

    let internal_routes = Router::new()
        .route(
            "/publish/{hub}/users/{user_id}",
            post(handlers::publish::publish_to_user),
        )
        .route(
            "/publish/{hub}/rooms/{room_id}",
            post(handlers::publish::publish_to_room),
        )
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_publish));

    Router::new()
        .merge(ws_routes)
        .nest("/api", api_routes)
        .nest("/internal", internal_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
