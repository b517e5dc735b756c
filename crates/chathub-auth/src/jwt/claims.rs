//! JWT claims structure carried by access tokens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use chathub_core::types::id::UserId;

/// JWT claims payload embedded in every access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject, the user ID. Issuers encode it either as a JSON number
    /// or as a decimal string; both are accepted.
    #[serde(deserialize_with = "deserialize_subject")]
    pub sub: u64,
    /// Issued-at timestamp (seconds since epoch).
    #[serde(default)]
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
}

impl Claims {
    /// Returns the user ID from the subject claim.
    pub fn user_id(&self) -> UserId {
        UserId(self.sub)
    }

    /// Returns the expiration as a `DateTime<Utc>`.
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or_else(Utc::now)
    }
}

fn deserialize_subject<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Subject {
        Number(u64),
        Text(String),
    }

    match Subject::deserialize(deserializer)? {
        Subject::Number(n) => Ok(n),
        Subject::Text(s) => s.parse().map_err(serde::de::Error::custom),
    }
}
