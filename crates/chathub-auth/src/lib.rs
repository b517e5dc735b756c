//! # chathub-auth
//!
//! Validates the bearer tokens presented on WebSocket upgrade and maps
//! them to the owning [`UserId`](chathub_core::types::UserId).

pub mod jwt;

pub use jwt::{Claims, JwtDecoder, JwtEncoder};
