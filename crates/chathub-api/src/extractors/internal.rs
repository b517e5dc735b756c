//! Shared-secret guard for the internal publish endpoint.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use subtle::ConstantTimeEq;

use chathub_core::error::AppError;

use crate::error::ApiError;
use crate::state::AppState;

/// Header carrying the shared secret.
pub const INTERNAL_TOKEN_HEADER: &str = "x-internal-token";

/// A caller allowed to publish. Always admitted when no secret is configured.
#[derive(Debug, Clone, Copy)]
pub struct InternalCaller;

impl FromRequestParts<AppState> for InternalCaller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.config.auth.internal_token.as_deref() else {
            return Ok(InternalCaller);
        };

        let provided = parts
            .headers
            .get(INTERNAL_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::authentication("Missing internal token"))?;

        if !secrets_match(provided, expected) {
            return Err(AppError::authentication("Invalid internal token").into());
        }
        Ok(InternalCaller)
    }
}

/// Constant-time in the secret's contents.
fn secrets_match(provided: &str, expected: &str) -> bool {
    provided.as_bytes().ct_eq(expected.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secrets_match() {
        assert!(secrets_match("s3cret", "s3cret"));
        assert!(!secrets_match("s3cres", "s3cret"));
        assert!(!secrets_match("s3cret-longer", "s3cret"));
        assert!(!secrets_match("", "s3cret"));
    }
}
