//! # Relay Errors

use shared_types::NostrError;
use thiserror::Error;

/// Relay pool error types.
#[derive(Debug, Error)]
pub enum RelayError {
    /// WebSocket handshake failed.
    #[error("Failed to connect to {url}: {reason}")]
    Connect {
        /// Relay URL
        url: String,
        /// Underlying reason
        reason: String,
    },

    /// WebSocket handshake did not finish in time.
    #[error("Connection to {0} timed out")]
    ConnectTimeout(String),

    /// The connection is gone.
    #[error("Connection to {0} is closed")]
    Closed(String),

    /// A client message could not be encoded.
    #[error("Encoding error: {0}")]
    Encode(#[from] NostrError),
}
