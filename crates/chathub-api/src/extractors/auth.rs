//! `AuthUser` extractor: pulls the bearer token from the query string or
//! the Authorization header and validates it.

use axum::extract::{FromRequestParts, Query};
use axum::http::Uri;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use serde::Deserialize;

use chathub_core::error::AppError;
use chathub_core::types::id::UserId;

use crate::error::ApiError;
use crate::state::AppState;

/// Query string of the WebSocket upgrade.
#[derive(Debug, Deserialize)]
pub struct WsQuery {
    /// JWT access token.
    pub token: Option<String>,
}

/// Authenticated owner of the request.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub UserId);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = token_from_query(&parts.uri)
            .or_else(|| bearer_token(parts))
            .ok_or_else(|| AppError::authentication("Token not provided"))?;

        let user_id = state.tokens.validate(&token).await?;
        Ok(AuthUser(user_id))
    }
}

/// `?token=...`, percent-decoded, if present and non-empty.
fn token_from_query(uri: &Uri) -> Option<String> {
    let Query(query) = Query::<WsQuery>::try_from_uri(uri).ok()?;
    query.token.filter(|token| !token.is_empty())
}

fn bearer_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
