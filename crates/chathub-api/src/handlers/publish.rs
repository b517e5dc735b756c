//! Internal publish endpoint.
//!
//! Upstream services serialize an event, then POST the raw bytes here. The
//! body is fanned out unchanged; the response is the fanout report.

use axum::Json;
use axum::extract::{Path, State};
use bytes::Bytes;
use tracing::debug;

use chathub_core::error::AppError;
use chathub_core::types::id::{RoomId, UserId};
use chathub_realtime::message::serializer::ensure_json;
use chathub_realtime::{FanoutReport, Hub, Scope};

use crate::error::ApiError;
use crate::extractors::InternalCaller;
use crate::state::AppState;

/// POST /internal/publish/{hub}/users/{user_id}
pub async fn publish_to_user(
    State(state): State<AppState>,
    _caller: InternalCaller,
    Path((hub, user_id)): Path<(String, u64)>,
    body: Bytes,
) -> Result<Json<FanoutReport>, ApiError> {
    let hub = resolve(&state, &hub)?;
    publish(hub, Scope::ToUser(UserId(user_id)), body).await
}

/// POST /internal/publish/{hub}/rooms/{room_id}
pub async fn publish_to_room(
    State(state): State<AppState>,
    _caller: InternalCaller,
    Path((hub, room_id)): Path<(String, u64)>,
    body: Bytes,
) -> Result<Json<FanoutReport>, ApiError> {
    let hub = resolve(&state, &hub)?;
    publish(hub, Scope::ToRoom(RoomId(room_id)), body).await
}

fn resolve<'a>(state: &'a AppState, name: &str) -> Result<&'a Hub, AppError> {
    state
        .realtime
        .hub(name)
        .ok_or_else(|| AppError::not_found(format!("Unknown hub '{name}'")))
}

async fn publish(hub: &Hub, scope: Scope, body: Bytes) -> Result<Json<FanoutReport>, ApiError> {
    ensure_json(&body)?;

    let report = hub.publish(scope, body).await;
    debug!(
        hub = %hub.variant(),
        scope = %scope,
        matched = report.matched,
        delivered = report.delivered,
        dropped = report.dropped,
        "Published"
    );
    Ok(Json(report))
}
