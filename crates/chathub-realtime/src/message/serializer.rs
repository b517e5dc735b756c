//! Payload serialization.

use serde::Serialize;

use chathub_core::error::AppError;

use crate::fanout::Payload;

/// Serialize an event once into a shareable payload.
pub fn to_payload<T: Serialize + ?Sized>(event: &T) -> Result<Payload, AppError> {
    Ok(Payload::from(serde_json::to_vec(event)?))
}

/// Check that a raw payload is a JSON document.
pub fn ensure_json(payload: &[u8]) -> Result<(), AppError> {
    serde_json::from_slice::<serde::de::IgnoredAny>(payload)?;
    Ok(())
}
