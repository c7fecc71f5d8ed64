//! # Error Types
//!
//! Errors raised while decoding, signing or verifying Nostr data.

use thiserror::Error;

/// Errors from the Nostr event model.
#[derive(Debug, Error)]
pub enum NostrError {
    /// A hex field could not be decoded.
    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    /// A fixed-size field had the wrong byte length.
    #[error("Invalid length: expected {expected} bytes, got {got}")]
    InvalidLength { expected: usize, got: usize },

    /// The secret key is not a valid secp256k1 scalar.
    #[error("Invalid secret key")]
    InvalidSecretKey,

    /// The public key is not a valid x-only point.
    #[error("Invalid public key")]
    InvalidPublicKey,

    /// Signing failed.
    #[error("Signing failed: {0}")]
    SigningFailed(String),

    /// Signature did not verify against the event id.
    #[error("Invalid signature")]
    InvalidSignature,

    /// The event id does not match its serialized content.
    #[error("Event id mismatch: declared {declared}, computed {computed}")]
    IdMismatch { declared: String, computed: String },

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Bech32 encoding or decoding failed.
    #[error("Bech32 error: {0}")]
    Bech32(String),

    /// A relay message could not be understood.
    #[error("Malformed relay message: {0}")]
    MalformedMessage(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_length_error() {
        let err = NostrError::InvalidLength {
            expected: 32,
            got: 31,
        };
        assert!(err.to_string().contains("expected 32"));
    }

    #[test]
    fn test_id_mismatch_error() {
        let err = NostrError::IdMismatch {
            declared: "aa".to_string(),
            computed: "bb".to_string(),
        };
        assert!(err.to_string().contains("declared aa"));
    }
}
