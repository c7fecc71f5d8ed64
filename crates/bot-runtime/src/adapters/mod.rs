//! # Adapters
//!
//! Implementations of the reply-tree outbound ports over the relay pool.

pub mod ports;

pub use ports::{PooledRelayHandle, RelayPoolConnector, RelayPoolFetcher};
