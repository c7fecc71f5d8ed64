//! # Live Subscriptions
//!
//! Long-lived subscriptions across many relays feeding one channel.
//!
//! Each relay runs its own loop: connect, subscribe, forward events, and on
//! loss reconnect with exponential backoff. Events seen on any relay are
//! remembered in a bounded LRU so the consumer gets each id once.

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;
use shared_types::{Event, EventId, Filter};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::connection::SubscriptionMessage;
use crate::pool::RelayPool;

type SeenCache = Arc<Mutex<LruCache<EventId, ()>>>;

const MIN_SEEN_CACHE: NonZeroUsize = match NonZeroUsize::new(16) {
    Some(n) => n,
    None => unreachable!(),
};

impl RelayPool {
    /// Subscribe to `filter` on every relay. The subscription lives until the
    /// receiver is dropped or the pool shuts down.
    pub fn subscribe(self: &Arc<Self>, relays: &[String], filter: Filter) -> mpsc::Receiver<Event> {
        let (tx, rx) = mpsc::channel(self.config.subscription_buffer.max(1));
        let capacity = NonZeroUsize::new(self.config.seen_cache_size).unwrap_or(MIN_SEEN_CACHE);
        let seen: SeenCache = Arc::new(Mutex::new(LruCache::new(capacity)));

        for url in relays {
            tokio::spawn(Arc::clone(self).subscription_loop(
                url.clone(),
                filter.clone(),
                tx.clone(),
                Arc::clone(&seen),
            ));
        }
        rx
    }

    async fn subscription_loop(
        self: Arc<Self>,
        url: String,
        filter: Filter,
        tx: mpsc::Sender<Event>,
        seen: SeenCache,
    ) {
        let mut attempts = 0u32;

        while !self.shutdown.is_cancelled() && !tx.is_closed() {
            match self.ensure_relay(&url).await {
                Ok(connection) => match connection.subscribe(vec![filter.clone()]) {
                    Ok(mut subscription) => {
                        attempts = 0;
                        info!(relay = %url, "[rc-01] Live subscription open");
                        loop {
                            tokio::select! {
                                _ = self.shutdown.cancelled() => return,
                                _ = tx.closed() => return,
                                message = subscription.recv() => match message {
                                    Some(SubscriptionMessage::Event(event)) => {
                                        if !mark_seen(&seen, event.id) {
                                            continue;
                                        }
                                        if tx.send(*event).await.is_err() {
                                            return;
                                        }
                                    }
                                    Some(SubscriptionMessage::EndOfStoredEvents) => {
                                        debug!(relay = %url, "[rc-01] Caught up");
                                    }
                                    Some(SubscriptionMessage::Closed(reason)) => {
                                        warn!(relay = %url, %reason, "[rc-01] Live subscription closed by relay");
                                        break;
                                    }
                                    None => {
                                        warn!(relay = %url, "[rc-01] Live subscription lost");
                                        break;
                                    }
                                },
                            }
                        }
                    }
                    Err(e) => warn!(relay = %url, error = %e, "[rc-01] Subscribe failed"),
                },
                Err(e) => warn!(relay = %url, error = %e, "[rc-01] Connect failed"),
            }

            attempts += 1;
            let delay = self.config.reconnect_delay(attempts);
            debug!(relay = %url, attempt = attempts, delay_ms = delay.as_millis() as u64, "[rc-01] Reconnecting");
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = self.shutdown.cancelled() => return,
                _ = tx.closed() => return,
            }
        }
    }
}

/// Returns `true` the first time `id` is seen.
fn mark_seen(seen: &SeenCache, id: EventId) -> bool {
    seen.lock().put(id, ()).is_none()
}
