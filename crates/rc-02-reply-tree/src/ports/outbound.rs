//! # Outbound Ports
//!
//! Relay access needed by the measurer and the publisher.

use std::sync::Arc;

use async_trait::async_trait;
use shared_types::{Event, Filter};
use tokio_util::sync::CancellationToken;

use crate::domain::{PublishOutcome, ReplyTreeError};

/// Multi-relay event query - outbound port.
#[async_trait]
pub trait EventFetcher: Send + Sync {
    /// Query every relay and collect matching stored events, deduplicated by
    /// id.
    ///
    /// Completes once every relay has reported end of stored events, closed
    /// the subscription, or failed. When `cancel` fires, returns what has
    /// been collected so far. Unreachable relays contribute nothing.
    async fn fetch_all(
        &self,
        relays: &[String],
        filter: &Filter,
        cancel: &CancellationToken,
    ) -> Vec<Event>;

    /// Newest matching event by `created_at`, if any relay holds one.
    async fn fetch_last_event(&self, relays: &[String], filter: &Filter) -> Option<Event> {
        let cancel = CancellationToken::new();
        self.fetch_all(relays, filter, &cancel)
            .await
            .into_iter()
            .max_by_key(|e| e.created_at)
    }
}

/// Relay connection manager - outbound port.
#[async_trait]
pub trait RelayConnector: Send + Sync {
    /// Return a live connection to `url`, opening one when needed.
    async fn ensure_connection(&self, url: &str) -> Result<Arc<dyn RelayHandle>, ReplyTreeError>;
}

/// A live relay connection - outbound port.
#[async_trait]
pub trait RelayHandle: Send + Sync {
    fn url(&self) -> &str;

    /// Send an event and wait for the relay's `OK`.
    async fn submit(&self, event: &Event) -> Result<PublishOutcome, ReplyTreeError>;
}
