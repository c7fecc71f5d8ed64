//! # Domain Errors
//!
//! Error types for reply-tree measurement and publishing.

use shared_types::{EventId, Kind};
use thiserror::Error;

/// Reply-tree error types.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReplyTreeError {
    /// The target event is not held by any read relay.
    #[error("Target event not found: {0}")]
    TargetNotFound(EventId),

    /// The target event exists but is not a text note.
    #[error("Target event {id} is kind {kind}, not a text note")]
    TargetNotTextNote {
        /// Target event id
        id: EventId,
        /// Actual kind
        kind: Kind,
    },

    /// Could not establish a connection to a relay.
    #[error("Connection to {relay} failed: {reason}")]
    ConnectionFailed {
        /// Relay URL
        relay: String,
        /// Underlying reason
        reason: String,
    },

    /// The relay connection closed before the operation finished.
    #[error("Connection to {0} closed")]
    ConnectionClosed(String),
}
