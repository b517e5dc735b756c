//! Health and stats handlers.

use axum::Json;
use axum::extract::State;

use chathub_realtime::EngineStats;

use crate::dto::response::HealthResponse;
use crate::error::ApiError;
use crate::state::AppState;

/// GET /api/health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /api/stats
pub async fn stats(State(state): State<AppState>) -> Result<Json<EngineStats>, ApiError> {
    Ok(Json(state.realtime.stats().await?))
}
