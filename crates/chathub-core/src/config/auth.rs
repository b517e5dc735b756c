//! Authentication configuration.

use serde::{Deserialize, Serialize};

/// Token validation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Secret key for JWT verification (HMAC-SHA256).
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// Allowed clock skew in seconds when checking `exp`/`nbf`.
    #[serde(default = "default_leeway")]
    pub leeway_seconds: u64,
    /// Shared secret required in `X-Internal-Token` by the publish endpoint.
    /// `None` leaves the endpoint open (development only).
    #[serde(default)]
    pub internal_token: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            leeway_seconds: default_leeway(),
            internal_token: None,
        }
    }
}

fn default_jwt_secret() -> String {
    "CHANGE_ME_IN_PRODUCTION".to_string()
}

fn default_leeway() -> u64 {
    5
}
