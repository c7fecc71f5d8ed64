//! # Domain Entities
//!
//! Measurement accumulator, traversal frontier and per-traversal context.

use std::collections::HashSet;

use shared_types::{Event, EventId, PublicKey};
use tokio_util::sync::CancellationToken;

/// Result of measuring a reply tree.
///
/// `leaves` is the running total of replies found across all rounds, i.e. the
/// descendant count, not the number of leaf nodes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplyTreeMeasurement {
    /// Rounds that yielded at least one reply.
    pub depth: u32,
    /// Replies found across all rounds.
    pub leaves: u64,
}

impl ReplyTreeMeasurement {
    /// Account for one non-empty round.
    pub fn record_round(&mut self, replies: usize) {
        self.depth += 1;
        self.leaves += replies as u64;
    }
}

/// Outcome of a deadline-bounded measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasureReplyTreeResult {
    /// Traversal finished before the deadline.
    Ok(ReplyTreeMeasurement),
    /// Deadline fired first; any partial count is discarded.
    TimedOut,
}

impl MeasureReplyTreeResult {
    pub fn measurement(&self) -> Option<ReplyTreeMeasurement> {
        match self {
            Self::Ok(m) => Some(*m),
            Self::TimedOut => None,
        }
    }

    pub fn is_timed_out(&self) -> bool {
        matches!(self, Self::TimedOut)
    }
}

/// Event ids discovered at the current traversal depth, in discovery order.
#[derive(Debug, Clone, Default)]
pub struct Frontier {
    ids: Vec<EventId>,
    index: HashSet<EventId>,
}

impl Frontier {
    /// Depth-0 frontier: just the target.
    pub fn root(target: EventId) -> Self {
        Self::from_ids([target])
    }

    pub fn from_ids(ids: impl IntoIterator<Item = EventId>) -> Self {
        let mut frontier = Self::default();
        for id in ids {
            if frontier.index.insert(id) {
                frontier.ids.push(id);
            }
        }
        frontier
    }

    pub fn from_events<'a>(events: impl IntoIterator<Item = &'a Event>) -> Self {
        Self::from_ids(events.into_iter().map(|e| e.id))
    }

    pub fn ids(&self) -> &[EventId] {
        &self.ids
    }

    pub fn contains(&self, id: &EventId) -> bool {
        self.index.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// State owned by exactly one traversal.
#[derive(Debug, Clone)]
pub struct TraversalContext {
    /// Relays to read replies from.
    pub read_relays: Vec<String>,
    /// Authors whose replies are never counted.
    pub excluded_authors: HashSet<PublicKey>,
    /// Fired by the deadline; observed by in-flight fetches.
    pub cancel: CancellationToken,
}

impl TraversalContext {
    pub fn new(read_relays: Vec<String>, excluded_authors: HashSet<PublicKey>) -> Self {
        Self {
            read_relays,
            excluded_authors,
            cancel: CancellationToken::new(),
        }
    }

    pub fn is_excluded(&self, author: &PublicKey) -> bool {
        self.excluded_authors.contains(author)
    }
}

/// Relay response to a submitted event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    Accepted,
    Rejected(String),
}

/// How one endpoint fared during a broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointStatus {
    Accepted,
    Rejected(String),
    Failed(String),
    TimedOut,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointResult {
    pub url: String,
    pub status: EndpointStatus,
}

/// Per-endpoint results of one broadcast, in endpoint order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReport {
    pub event_id: EventId,
    pub endpoints: Vec<EndpointResult>,
}

impl PublishReport {
    pub fn accepted_count(&self) -> usize {
        self.endpoints
            .iter()
            .filter(|r| r.status == EndpointStatus::Accepted)
            .count()
    }

    pub fn status_of(&self, url: &str) -> Option<&EndpointStatus> {
        self.endpoints
            .iter()
            .find(|r| r.url == url)
            .map(|r| &r.status)
    }
}
