//! JWT token validation.

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

use chathub_core::config::AuthConfig;
use chathub_core::error::AppError;
use chathub_core::result::AppResult;
use chathub_core::traits::TokenValidator;
use chathub_core::types::id::UserId;

use super::claims::Claims;

/// Validates HS256 bearer tokens and extracts the owning user.
#[derive(Clone)]
pub struct JwtDecoder {
    /// HMAC secret key for verification.
    decoding_key: DecodingKey,
    /// Validation configuration.
    validation: Validation,
}

impl std::fmt::Debug for JwtDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtDecoder")
            .field("validation", &self.validation)
            .finish()
    }
}

impl JwtDecoder {
    /// Creates a new decoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.leeway = config.leeway_seconds;

        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Decodes and validates a token string.
    ///
    /// Checks signature, expiration, and that the subject is a non-zero user id.
    pub fn decode_access_token(&self, token: &str) -> Result<Claims, AppError> {
        if token.is_empty() {
            return Err(AppError::authentication("Token not provided"));
        }

        let token_data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                        AppError::authentication("Token has expired")
                    }
                    jsonwebtoken::errors::ErrorKind::ImmatureSignature => {
                        AppError::authentication("Token not valid yet")
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                        AppError::authentication("Token signature is invalid")
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidToken => {
                        AppError::authentication("Invalid token format")
                    }
                    _ => AppError::authentication(format!("Token validation failed: {e}")),
                }
            })?;

        if token_data.claims.sub == 0 {
            tracing::warn!("Token valid but subject is zero");
            return Err(AppError::authentication("Invalid user identifier in token"));
        }

        Ok(token_data.claims)
    }
}

#[async_trait]
impl TokenValidator for JwtDecoder {
    async fn validate(&self, token: &str) -> AppResult<UserId> {
        let claims = self.decode_access_token(token)?;
        tracing::debug!(user_id = %claims.sub, "Token validated");
        Ok(claims.user_id())
    }
}

#[cfg(test)]
mod tests {
    use chathub_core::error::ErrorKind;
    use jsonwebtoken::{EncodingKey, Header, encode};

    use super::*;
    use crate::jwt::encoder::JwtEncoder;

    fn config(secret: &str) -> AuthConfig {
        AuthConfig {
            jwt_secret: secret.to_string(),
            ..AuthConfig::default()
        }
    }

    #[tokio::test]
    async fn test_valid_token_yields_user() {
        let cfg = config("secret");
        let token = JwtEncoder::new(&cfg)
            .issue(UserId(42), chrono::Duration::minutes(5))
            .expect("issue");

        let user = JwtDecoder::new(&cfg).validate(&token).await.expect("valid");
        assert_eq!(user, UserId(42));
    }

    #[tokio::test]
    async fn test_wrong_secret_rejected() {
        let token = JwtEncoder::new(&config("one"))
            .issue(UserId(42), chrono::Duration::minutes(5))
            .expect("issue");

        let err = JwtDecoder::new(&config("two"))
            .validate(&token)
            .await
            .expect_err("must fail");
        assert_eq!(err.kind, ErrorKind::Authentication);
    }

    #[tokio::test]
    async fn test_expired_token_rejected() {
        let cfg = config("secret");
        let token = JwtEncoder::new(&cfg)
            .issue(UserId(42), chrono::Duration::minutes(-10))
            .expect("issue");

        let err = JwtDecoder::new(&cfg)
            .validate(&token)
            .await
            .expect_err("must fail");
        assert_eq!(err.message, "Token has expired");
    }

    #[tokio::test]
    async fn test_zero_subject_rejected() {
        let cfg = config("secret");
        let claims = Claims {
            sub: 0,
            iat: chrono::Utc::now().timestamp(),
            exp: chrono::Utc::now().timestamp() + 300,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(cfg.jwt_secret.as_bytes()),
        )
        .expect("encode");

        assert!(JwtDecoder::new(&cfg).validate(&token).await.is_err());
    }

    #[tokio::test]
    async fn test_empty_token_rejected() {
        let err = JwtDecoder::new(&config("secret"))
            .validate("")
            .await
            .expect_err("must fail");
        assert_eq!(err.message, "Token not provided");
    }
}
