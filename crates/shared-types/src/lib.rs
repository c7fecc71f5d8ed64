//! # Shared Types Crate
//!
//! This crate contains the Nostr event model used by every other crate in the
//! workspace: events, keys, filters, thread references and the relay wire
//! protocol (NIP-01).
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-crate types are defined here.
//! - **Immutable Events**: An `Event` is only produced by signing an
//!   `EventBuilder` or by deserializing relay output; nothing mutates it.
//! - **Hex on the Wire**: Ids, keys and signatures are fixed-size byte arrays
//!   in memory and lowercase hex in JSON.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod entities;
pub mod errors;
pub mod filter;
pub mod keys;
pub mod nip10;
pub mod nip19;
pub mod wire;

pub use entities::*;
pub use errors::NostrError;
pub use filter::Filter;
pub use keys::{EventBuilder, Keys};
pub use nip10::{direct_reply_target, parse_thread, EventPointer, ThreadRefs};
pub use nip19::{decode_nevent, encode_nevent};
pub use wire::{ClientMessage, RelayMessage};

use std::time::{SystemTime, UNIX_EPOCH};

/// Current unix time in seconds.
pub fn unix_time() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
