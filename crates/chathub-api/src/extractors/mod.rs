//! Request extractors.

pub mod auth;
pub mod internal;

pub use auth::AuthUser;
pub use internal::InternalCaller;
