//! # Fan-Out Fetch
//!
//! Runs one stored-event query against many relays at once and merges the
//! answers.
//!
//! A relay's part ends at the first of: `EOSE`, `CLOSED`, connection loss,
//! the per-relay fetch timeout, or cancellation. Its subscription is closed
//! on the way out. Relays that cannot be reached contribute nothing.

use std::collections::HashSet;

use futures::future::join_all;
use shared_types::{Event, Filter};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::connection::SubscriptionMessage;
use crate::pool::RelayPool;

impl RelayPool {
    /// Stored events matching `filter` across `relays`, deduplicated by id
    /// in first-seen order.
    pub async fn fetch_all(
        &self,
        relays: &[String],
        filter: &Filter,
        cancel: &CancellationToken,
    ) -> Vec<Event> {
        let batches = join_all(relays.iter().map(|url| self.fetch_from(url, filter, cancel))).await;

        let mut seen = HashSet::new();
        let mut merged = Vec::new();
        for event in batches.into_iter().flatten() {
            if seen.insert(event.id) {
                merged.push(event);
            }
        }
        merged
    }

    /// Newest matching event by `created_at`.
    pub async fn fetch_last_event(&self, relays: &[String], filter: &Filter) -> Option<Event> {
        let cancel = CancellationToken::new();
        self.fetch_all(relays, filter, &cancel)
            .await
            .into_iter()
            .max_by_key(|e| e.created_at)
    }

    async fn fetch_from(&self, url: &str, filter: &Filter, cancel: &CancellationToken) -> Vec<Event> {
        let connection = tokio::select! {
            result = self.ensure_relay(url) => match result {
                Ok(connection) => connection,
                Err(e) => {
                    debug!(relay = %url, error = %e, "[rc-01] Skipping relay");
                    return Vec::new();
                }
            },
            _ = cancel.cancelled() => return Vec::new(),
        };

        let mut subscription = match connection.subscribe(vec![filter.clone()]) {
            Ok(subscription) => subscription,
            Err(e) => {
                debug!(relay = %url, error = %e, "[rc-01] Subscribe failed");
                return Vec::new();
            }
        };

        let deadline = tokio::time::sleep(self.config.fetch_timeout());
        tokio::pin!(deadline);

        let mut events = Vec::new();
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = &mut deadline => {
                    debug!(relay = %url, "[rc-01] Fetch timed out before EOSE");
                    break;
                }
                message = subscription.recv() => match message {
                    Some(SubscriptionMessage::Event(event)) => {
                        if filter.matches(&event) {
                            events.push(*event);
                        }
                    }
                    Some(SubscriptionMessage::EndOfStoredEvents) => break,
                    Some(SubscriptionMessage::Closed(reason)) => {
                        debug!(relay = %url, %reason, "[rc-01] Fetch closed by relay");
                        break;
                    }
                    None => break,
                },
            }
        }
        events
    }
}
