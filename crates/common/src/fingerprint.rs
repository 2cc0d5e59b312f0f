//! Payload fingerprinting
//!
//! Produces a stable hex digest for any serializable payload. Used to key
//! throttling records so that repeated identical requests can be
//! recognized without storing the payloads themselves.

use serde::Serialize;
use thiserror::Error;

/// Error type for fingerprinting
#[derive(Debug, Error)]
pub enum FingerprintError {
    /// The payload could not be serialized to canonical JSON
    #[error("failed to serialize payload: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Compute a stable fingerprint for a serializable payload.
///
/// The payload is serialized to JSON and hashed with blake3. Two payloads
/// fingerprint identically iff their serialized forms are identical, so
/// struct field order (fixed at compile time) determines canonical form.
///
/// # Errors
///
/// Returns [`FingerprintError::Serialize`] if the payload cannot be
/// serialized (e.g. a map with non-string keys).
pub fn fingerprint<T: Serialize>(payload: &T) -> Result<String, FingerprintError> {
    let bytes = serde_json::to_vec(payload)?;
    Ok(hex::encode(blake3::hash(&bytes).as_bytes()))
}
