//! # Port Adapters
//!
//! ```text
//! ReplyTreeService ──► EventFetcher   ──► RelayPoolFetcher   ──┐
//!                  └─► RelayConnector ──► RelayPoolConnector ──┴──► RelayPool
//! ```

pub mod relay_pool;

pub use relay_pool::{PooledRelayHandle, RelayPoolConnector, RelayPoolFetcher};
