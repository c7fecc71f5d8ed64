//! # Relay Connection
//!
//! One WebSocket connection to one relay, shared by every query and publish
//! aimed at that relay.
//!
//! ```text
//!            ┌──────────── writer task ◄── outbound queue ◄── send()
//! WebSocket ─┤
//!            └──────────── reader task ──► routes: sub id  → subscription channel
//!                                                  event id → OK waiter
//! ```
//!
//! When either task ends, the `closed` token fires, every subscription
//! channel is dropped and every OK waiter fails.

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use rand::distributions::Alphanumeric;
use rand::Rng;
use shared_types::{ClientMessage, Event, EventId, Filter, RelayMessage};
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::errors::RelayError;

const SUBSCRIPTION_ID_LEN: usize = 12;

/// Relay acknowledgement of a published event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AckStatus {
    pub accepted: bool,
    pub message: String,
}

/// What a subscription receives from its relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionMessage {
    Event(Box<Event>),
    EndOfStoredEvents,
    Closed(String),
}

#[derive(Default)]
struct Routes {
    subscriptions: Mutex<HashMap<String, mpsc::UnboundedSender<SubscriptionMessage>>>,
    acks: Mutex<HashMap<EventId, oneshot::Sender<AckStatus>>>,
}

impl Routes {
    fn dispatch(&self, url: &str, text: &str) {
        let message = match RelayMessage::from_json(text) {
            Ok(message) => message,
            Err(e) => {
                trace!(relay = %url, error = %e, "[rc-01] Ignoring relay message");
                return;
            }
        };

        match message {
            RelayMessage::Event {
                subscription_id,
                event,
            } => {
                if let Err(e) = event.verify() {
                    debug!(relay = %url, event_id = %event.id, error = %e, "[rc-01] Dropping invalid event");
                    return;
                }
                self.forward(&subscription_id, SubscriptionMessage::Event(event));
            }
            RelayMessage::EndOfStoredEvents(subscription_id) => {
                self.forward(&subscription_id, SubscriptionMessage::EndOfStoredEvents);
            }
            RelayMessage::Closed {
                subscription_id,
                message,
            } => {
                debug!(relay = %url, sub = %subscription_id, %message, "[rc-01] Subscription closed by relay");
                if let Some(tx) = self.subscriptions.lock().remove(&subscription_id) {
                    let _ = tx.send(SubscriptionMessage::Closed(message));
                }
            }
            RelayMessage::Ok {
                event_id,
                accepted,
                message,
            } => {
                if let Some(tx) = self.acks.lock().remove(&event_id) {
                    let _ = tx.send(AckStatus { accepted, message });
                }
            }
            RelayMessage::Notice(notice) => {
                debug!(relay = %url, %notice, "[rc-01] Relay notice");
            }
        }
    }

    fn forward(&self, subscription_id: &str, message: SubscriptionMessage) {
        let mut subscriptions = self.subscriptions.lock();
        if let Some(tx) = subscriptions.get(subscription_id) {
            if tx.send(message).is_err() {
                subscriptions.remove(subscription_id);
            }
        }
    }

    fn clear(&self) {
        self.subscriptions.lock().clear();
        self.acks.lock().clear();
    }
}

/// A live connection to one relay.
pub struct RelayConnection {
    url: String,
    outbound: mpsc::UnboundedSender<Message>,
    routes: Arc<Routes>,
    closed: CancellationToken,
}

impl RelayConnection {
    /// Open a WebSocket to `url` and start the reader and writer tasks.
    pub async fn connect(url: &str, timeout: Duration) -> Result<Arc<Self>, RelayError> {
        let (stream, _) = tokio::time::timeout(timeout, connect_async(url))
            .await
            .map_err(|_| RelayError::ConnectTimeout(url.to_string()))?
            .map_err(|e| RelayError::Connect {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let (mut write, mut read) = stream.split();
        let (outbound, mut queue) = mpsc::unbounded_channel::<Message>();
        let routes = Arc::new(Routes::default());
        let closed = CancellationToken::new();

        let writer_closed = closed.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = writer_closed.cancelled() => break,
                    next = queue.recv() => match next {
                        Some(message) => {
                            if write.send(message).await.is_err() {
                                break;
                            }
                        }
                        None => break,
                    },
                }
            }
            let _ = write.close().await;
            writer_closed.cancel();
        });

        let reader_closed = closed.clone();
        let reader_routes = Arc::clone(&routes);
        let reader_outbound = outbound.clone();
        let reader_url = url.to_string();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = reader_closed.cancelled() => break,
                    next = read.next() => match next {
                        Some(Ok(Message::Text(text))) => {
                            reader_routes.dispatch(&reader_url, text.as_str());
                        }
                        Some(Ok(Message::Ping(data))) => {
                            let _ = reader_outbound.send(Message::Pong(data));
                        }
                        Some(Ok(Message::Close(_))) | None => break,
                        Some(Err(e)) => {
                            warn!(relay = %reader_url, error = %e, "[rc-01] Connection error");
                            break;
                        }
                        Some(Ok(_)) => {}
                    },
                }
            }
            debug!(relay = %reader_url, "[rc-01] Connection closed");
            reader_closed.cancel();
            reader_routes.clear();
        });

        Ok(Arc::new(Self {
            url: url.to_string(),
            outbound,
            routes,
            closed,
        }))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Resolves once the connection is gone.
    pub async fn closed(&self) {
        self.closed.cancelled().await
    }

    /// Tear the connection down.
    pub fn close(&self) {
        self.closed.cancel();
    }

    fn send(&self, message: &ClientMessage) -> Result<(), RelayError> {
        if self.is_closed() {
            return Err(RelayError::Closed(self.url.clone()));
        }
        let json = message.to_json()?;
        self.outbound
            .send(Message::Text(json.into()))
            .map_err(|_| RelayError::Closed(self.url.clone()))
    }

    /// Open a subscription. Dropping the returned handle sends `CLOSE`.
    pub fn subscribe(self: &Arc<Self>, filters: Vec<Filter>) -> Result<Subscription, RelayError> {
        let id = new_subscription_id();
        let (tx, rx) = mpsc::unbounded_channel();
        self.routes.subscriptions.lock().insert(id.clone(), tx);

        let req = ClientMessage::Req {
            subscription_id: id.clone(),
            filters,
        };
        if let Err(e) = self.send(&req) {
            self.routes.subscriptions.lock().remove(&id);
            return Err(e);
        }
        trace!(relay = %self.url, sub = %id, "[rc-01] Subscribed");

        Ok(Subscription {
            id,
            receiver: rx,
            connection: Arc::downgrade(self),
        })
    }

    /// Send an event and wait for the relay's `OK`.
    pub async fn publish(&self, event: &Event) -> Result<AckStatus, RelayError> {
        let (tx, rx) = oneshot::channel();
        self.routes.acks.lock().insert(event.id, tx);

        if let Err(e) = self.send(&ClientMessage::Event(Box::new(event.clone()))) {
            self.routes.acks.lock().remove(&event.id);
            return Err(e);
        }

        let result = tokio::select! {
            ack = rx => ack.map_err(|_| RelayError::Closed(self.url.clone())),
            _ = self.closed.cancelled() => Err(RelayError::Closed(self.url.clone())),
        };
        if result.is_err() {
            self.routes.acks.lock().remove(&event.id);
        }
        result
    }

    fn unsubscribe(&self, id: &str) {
        if self.routes.subscriptions.lock().remove(id).is_some() {
            let _ = self.send(&ClientMessage::Close(id.to_string()));
        }
    }
}

impl Drop for RelayConnection {
    fn drop(&mut self) {
        self.closed.cancel();
    }
}

/// An open subscription on one relay.
pub struct Subscription {
    id: String,
    receiver: mpsc::UnboundedReceiver<SubscriptionMessage>,
    connection: Weak<RelayConnection>,
}

impl Subscription {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Next message, or `None` once the subscription or its connection ends.
    pub async fn recv(&mut self) -> Option<SubscriptionMessage> {
        self.receiver.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(connection) = self.connection.upgrade() {
            connection.unsubscribe(&self.id);
        }
    }
}

fn new_subscription_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SUBSCRIPTION_ID_LEN)
        .map(char::from)
        .collect()
}
