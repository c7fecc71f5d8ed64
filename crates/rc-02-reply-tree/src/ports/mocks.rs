//! # Mock Implementations for Testing
//!
//! In-memory relay doubles for the outbound ports.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use shared_types::{Event, EventId, Filter, Kind, PublicKey, Signature, Tag};
use tokio_util::sync::CancellationToken;

use super::outbound::{EventFetcher, RelayConnector, RelayHandle};
use crate::domain::{PublishOutcome, ReplyTreeError};

/// Deterministic event id for fixtures.
pub fn mock_event_id(n: u32) -> EventId {
    let mut bytes = [0u8; 32];
    bytes[28..].copy_from_slice(&n.to_be_bytes());
    EventId::from_bytes(bytes)
}

/// Deterministic public key for fixtures.
pub fn mock_pubkey(n: u8) -> PublicKey {
    PublicKey::from_bytes([n; 32])
}

/// Unsigned fixture event. Signatures are zeroed.
pub fn mock_event(id: EventId, author: PublicKey, kind: Kind, tags: Vec<Tag>) -> Event {
    Event {
        id,
        pubkey: author,
        created_at: 1_700_000_000,
        kind,
        tags,
        content: String::new(),
        sig: Signature::from_bytes([0; 64]),
    }
}

/// Fixture text note replying to `parent` with a single unmarked `e` tag.
pub fn mock_reply(id: EventId, author: PublicKey, parent: EventId) -> Event {
    mock_event(id, author, Kind::TEXT_NOTE, vec![Tag::event(&parent, "")])
}

/// A single logical relay holding events in memory.
///
/// Relay URLs passed to `fetch_all` are ignored.
#[derive(Default)]
pub struct InMemoryRelay {
    events: RwLock<Vec<Event>>,
    fetch_delay: Duration,
    fetch_calls: AtomicUsize,
}

impl InMemoryRelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `fetch_all` call waits this long before answering.
    pub fn with_fetch_delay(mut self, delay: Duration) -> Self {
        self.fetch_delay = delay;
        self
    }

    pub fn with_events(self, events: impl IntoIterator<Item = Event>) -> Self {
        self.events.write().extend(events);
        self
    }

    pub fn insert(&self, event: Event) {
        self.events.write().push(event);
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventFetcher for InMemoryRelay {
    async fn fetch_all(
        &self,
        _relays: &[String],
        filter: &Filter,
        cancel: &CancellationToken,
    ) -> Vec<Event> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if !self.fetch_delay.is_zero() {
            tokio::select! {
                _ = tokio::time::sleep(self.fetch_delay) => {}
                _ = cancel.cancelled() => return Vec::new(),
            }
        }
        self.events
            .read()
            .iter()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect()
    }
}

/// Scripted behaviour of a mock relay endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockRelayBehavior {
    /// Acknowledge immediately with `OK true`.
    Accept,
    /// Acknowledge immediately with `OK false`.
    Reject(String),
    /// Acknowledge with `OK true` after a delay.
    Delayed(Duration),
    /// Connect but never acknowledge.
    Silent,
    /// Refuse the connection.
    Unreachable,
}

/// Connector over a fixed table of scripted endpoints. Unknown URLs are
/// unreachable.
#[derive(Default, Clone)]
pub struct MockRelayConnector {
    behaviors: HashMap<String, MockRelayBehavior>,
    submitted: Arc<Mutex<Vec<(String, Event)>>>,
}

impl MockRelayConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_relay(mut self, url: &str, behavior: MockRelayBehavior) -> Self {
        self.behaviors.insert(url.to_string(), behavior);
        self
    }

    /// Every event handed to a connected endpoint, with its URL, in order.
    pub fn submitted(&self) -> Vec<(String, Event)> {
        self.submitted.lock().clone()
    }

    pub fn submitted_to(&self, url: &str) -> Vec<Event> {
        self.submitted
            .lock()
            .iter()
            .filter(|(u, _)| u == url)
            .map(|(_, e)| e.clone())
            .collect()
    }
}

#[async_trait]
impl RelayConnector for MockRelayConnector {
    async fn ensure_connection(&self, url: &str) -> Result<Arc<dyn RelayHandle>, ReplyTreeError> {
        match self.behaviors.get(url) {
            None | Some(MockRelayBehavior::Unreachable) => Err(ReplyTreeError::ConnectionFailed {
                relay: url.to_string(),
                reason: "connection refused".to_string(),
            }),
            Some(behavior) => Ok(Arc::new(MockRelayHandle {
                url: url.to_string(),
                behavior: behavior.clone(),
                submitted: Arc::clone(&self.submitted),
            })),
        }
    }
}

struct MockRelayHandle {
    url: String,
    behavior: MockRelayBehavior,
    submitted: Arc<Mutex<Vec<(String, Event)>>>,
}

#[async_trait]
impl RelayHandle for MockRelayHandle {
    fn url(&self) -> &str {
        &self.url
    }

    async fn submit(&self, event: &Event) -> Result<PublishOutcome, ReplyTreeError> {
        self.submitted.lock().push((self.url.clone(), event.clone()));
        match &self.behavior {
            MockRelayBehavior::Accept => Ok(PublishOutcome::Accepted),
            MockRelayBehavior::Reject(reason) => Ok(PublishOutcome::Rejected(reason.clone())),
            MockRelayBehavior::Delayed(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(PublishOutcome::Accepted)
            }
            MockRelayBehavior::Silent => {
                std::future::pending::<Result<PublishOutcome, ReplyTreeError>>().await
            }
            MockRelayBehavior::Unreachable => Err(ReplyTreeError::ConnectionClosed(self.url.clone())),
        }
    }
}
