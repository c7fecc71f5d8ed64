//! # Relay Pool Configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Relay pool configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayPoolConfig {
    /// WebSocket handshake timeout in milliseconds.
    pub connect_timeout_ms: u64,

    /// Upper bound in milliseconds for one relay to finish a stored-event
    /// query. Relays that never send `EOSE` are cut off here.
    pub fetch_timeout_ms: u64,

    /// Base delay for live-subscription reconnects (exponential backoff).
    pub reconnect_base_delay_ms: u64,

    /// Cap on the reconnect delay.
    pub max_reconnect_delay_ms: u64,

    /// Event ids remembered for live-subscription deduplication.
    pub seen_cache_size: usize,

    /// Buffer of the live-subscription channel.
    pub subscription_buffer: usize,
}

impl Default for RelayPoolConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 10_000,
            fetch_timeout_ms: 10_000,
            reconnect_base_delay_ms: 2_000,
            max_reconnect_delay_ms: 60_000,
            seen_cache_size: 10_000,
            subscription_buffer: 1_024,
        }
    }
}

impl RelayPoolConfig {
    /// Create a config for testing (short timeouts).
    pub fn for_testing() -> Self {
        Self {
            connect_timeout_ms: 1_000,
            fetch_timeout_ms: 500,
            reconnect_base_delay_ms: 50,
            max_reconnect_delay_ms: 200,
            seen_cache_size: 100,
            subscription_buffer: 16,
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    /// Delay before reconnect attempt `attempt` (1-based).
    pub fn reconnect_delay(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.saturating_sub(1).min(6);
        Duration::from_millis(
            self.reconnect_base_delay_ms
                .saturating_mul(factor)
                .min(self.max_reconnect_delay_ms),
        )
    }
}
