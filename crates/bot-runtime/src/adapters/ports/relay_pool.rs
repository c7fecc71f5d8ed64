//! # Relay Pool Port Adapters
//!
//! Implements the outbound port traits required by rc-02-reply-tree.
//!
//! ## Ports Implemented
//!
//! - `EventFetcher` - fan-out stored-event queries
//! - `RelayConnector` - shared connection lookup
//! - `RelayHandle` - publish with `OK` acknowledgement

use std::sync::Arc;

use async_trait::async_trait;
use rc_01_relay_pool::{RelayConnection, RelayError, RelayPool};
use rc_02_reply_tree::{EventFetcher, PublishOutcome, RelayConnector, RelayHandle, ReplyTreeError};
use shared_types::{Event, Filter};
use tokio_util::sync::CancellationToken;

// =============================================================================
// EventFetcher Adapter
// =============================================================================

/// Adapter implementing rc-02's EventFetcher trait.
#[derive(Clone)]
pub struct RelayPoolFetcher {
    pool: Arc<RelayPool>,
}

impl RelayPoolFetcher {
    pub fn new(pool: Arc<RelayPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventFetcher for RelayPoolFetcher {
    async fn fetch_all(
        &self,
        relays: &[String],
        filter: &Filter,
        cancel: &CancellationToken,
    ) -> Vec<Event> {
        self.pool.fetch_all(relays, filter, cancel).await
    }
}

// =============================================================================
// RelayConnector Adapter
// =============================================================================

/// Adapter implementing rc-02's RelayConnector trait.
#[derive(Clone)]
pub struct RelayPoolConnector {
    pool: Arc<RelayPool>,
}

impl RelayPoolConnector {
    pub fn new(pool: Arc<RelayPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RelayConnector for RelayPoolConnector {
    async fn ensure_connection(&self, url: &str) -> Result<Arc<dyn RelayHandle>, ReplyTreeError> {
        let connection = self
            .pool
            .ensure_relay(url)
            .await
            .map_err(|e| to_reply_tree_error(url, e))?;
        Ok(Arc::new(PooledRelayHandle { connection }))
    }
}

/// A pooled connection seen through rc-02's RelayHandle trait.
pub struct PooledRelayHandle {
    connection: Arc<RelayConnection>,
}

#[async_trait]
impl RelayHandle for PooledRelayHandle {
    fn url(&self) -> &str {
        self.connection.url()
    }

    async fn submit(&self, event: &Event) -> Result<PublishOutcome, ReplyTreeError> {
        let ack = self
            .connection
            .publish(event)
            .await
            .map_err(|e| to_reply_tree_error(self.connection.url(), e))?;
        Ok(if ack.accepted {
            PublishOutcome::Accepted
        } else {
            PublishOutcome::Rejected(ack.message)
        })
    }
}

fn to_reply_tree_error(url: &str, error: RelayError) -> ReplyTreeError {
    match error {
        RelayError::Closed(_) => ReplyTreeError::ConnectionClosed(url.to_string()),
        other => ReplyTreeError::ConnectionFailed {
            relay: url.to_string(),
            reason: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rc_01_relay_pool::RelayPoolConfig;

    #[test]
    fn test_error_mapping() {
        assert_eq!(
            to_reply_tree_error("wss://r", RelayError::Closed("wss://r".into())),
            ReplyTreeError::ConnectionClosed("wss://r".into())
        );
        assert!(matches!(
            to_reply_tree_error("wss://r", RelayError::ConnectTimeout("wss://r".into())),
            ReplyTreeError::ConnectionFailed { .. }
        ));
    }

    #[tokio::test]
    async fn test_unreachable_relay_maps_to_connection_failed() {
        let pool = Arc::new(RelayPool::new(RelayPoolConfig::for_testing()));
        let connector = RelayPoolConnector::new(pool);
        let result = connector.ensure_connection("ws://127.0.0.1:1").await;
        assert!(matches!(result, Err(ReplyTreeError::ConnectionFailed { .. })));
    }

    #[tokio::test]
    async fn test_fetcher_with_no_relays() {
        let pool = Arc::new(RelayPool::new(RelayPoolConfig::for_testing()));
        let fetcher = RelayPoolFetcher::new(pool);
        let events = fetcher
            .fetch_all(&[], &Filter::new(), &CancellationToken::new())
            .await;
        assert!(events.is_empty());
    }
}
