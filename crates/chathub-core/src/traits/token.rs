//! Bearer token validation seam.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::id::UserId;

/// Maps an opaque bearer token to the authenticated principal.
///
/// The hub trusts the returned [`UserId`] for the whole lifetime of the
/// connection and never re-validates it.
#[async_trait]
pub trait TokenValidator: Send + Sync + std::fmt::Debug + 'static {
    /// Validate `token`, returning the owning user or an authentication error.
    async fn validate(&self, token: &str) -> AppResult<UserId>;
}
