//! # Relay Pool
//!
//! Keeps at most one live connection per relay URL and opens connections
//! lazily. A connection found dead is replaced on the next request.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use shared_types::Event;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::RelayPoolConfig;
use crate::connection::{AckStatus, RelayConnection};
use crate::errors::RelayError;

type Slot = Arc<tokio::sync::Mutex<Option<Arc<RelayConnection>>>>;

/// Shared pool of relay connections.
pub struct RelayPool {
    pub(crate) config: RelayPoolConfig,
    slots: Mutex<HashMap<String, Slot>>,
    pub(crate) shutdown: CancellationToken,
}

impl RelayPool {
    pub fn new(config: RelayPoolConfig) -> Self {
        Self {
            config,
            slots: Mutex::new(HashMap::new()),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> &RelayPoolConfig {
        &self.config
    }

    /// Return the live connection to `url`, connecting if there is none.
    ///
    /// Concurrent callers for the same URL share one handshake.
    pub async fn ensure_relay(&self, url: &str) -> Result<Arc<RelayConnection>, RelayError> {
        if self.shutdown.is_cancelled() {
            return Err(RelayError::Closed(url.to_string()));
        }

        let slot = Arc::clone(self.slots.lock().entry(url.to_string()).or_default());
        let mut current = slot.lock().await;

        if let Some(connection) = current.as_ref() {
            if !connection.is_closed() {
                return Ok(Arc::clone(connection));
            }
            debug!(relay = %url, "[rc-01] Replacing dead connection");
        }

        let connection = RelayConnection::connect(url, self.config.connect_timeout()).await?;
        info!(relay = %url, "[rc-01] Connected");
        *current = Some(Arc::clone(&connection));
        Ok(connection)
    }

    /// Publish to one relay and wait for its `OK`.
    pub async fn publish(&self, url: &str, event: &Event) -> Result<AckStatus, RelayError> {
        let connection = self.ensure_relay(url).await?;
        connection.publish(event).await
    }

    /// URLs with a live connection.
    pub fn connected_relays(&self) -> Vec<String> {
        self.slots
            .lock()
            .iter()
            .filter(|(_, slot)| {
                slot.try_lock()
                    .map(|c| c.as_ref().is_some_and(|c| !c.is_closed()))
                    .unwrap_or(false)
            })
            .map(|(url, _)| url.clone())
            .collect()
    }

    /// Close every connection and stop live subscriptions.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
        for slot in self.slots.lock().values() {
            if let Ok(current) = slot.try_lock() {
                if let Some(connection) = current.as_ref() {
                    connection.close();
                }
            }
        }
        info!("[rc-01] Relay pool shut down");
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}
