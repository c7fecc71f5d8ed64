//! # RC-01 Relay Pool
//!
//! WebSocket plumbing to Nostr relays.
//!
//! ## Responsibilities
//!
//! | Concern | Entry point |
//! |---------|-------------|
//! | One shared connection per relay | [`RelayPool::ensure_relay`] |
//! | Stored-event query across relays | [`RelayPool::fetch_all`] |
//! | Publish with `OK` acknowledgement | [`RelayPool::publish`] |
//! | Live multi-relay subscription | [`RelayPool::subscribe`] |
//!
//! ## Module Structure
//!
//! ```text
//! rc-01-relay-pool/
//! ├── connection.rs    # RelayConnection: reader/writer tasks, routing
//! ├── pool.rs          # RelayPool: lazy connect, dead-connection replacement
//! ├── fetcher.rs       # Fan-out stored-event queries
//! ├── subscription.rs  # Live subscriptions with backoff and LRU dedup
//! ├── config.rs        # RelayPoolConfig
//! └── errors.rs        # RelayError
//! ```

#![warn(clippy::all)]

pub mod config;
pub mod connection;
pub mod errors;
pub mod fetcher;
pub mod pool;
pub mod subscription;

pub use config::RelayPoolConfig;
pub use connection::{AckStatus, RelayConnection, Subscription, SubscriptionMessage};
pub use errors::RelayError;
pub use pool::RelayPool;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
