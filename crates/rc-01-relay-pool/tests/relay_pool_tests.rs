//! Relay pool tests against an in-process WebSocket relay.

use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use rc_01_relay_pool::{RelayPool, RelayPoolConfig};
use serde_json::{json, Value};
use shared_types::{Event, EventBuilder, EventId, Filter, Keys, Kind, Tag};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

#[derive(Clone, Copy)]
struct RelayMode {
    send_eose: bool,
    ack_events: bool,
}

impl Default for RelayMode {
    fn default() -> Self {
        Self {
            send_eose: true,
            ack_events: true,
        }
    }
}

struct TestRelay {
    url: String,
    stored: Arc<Mutex<Vec<Event>>>,
    live: broadcast::Sender<Event>,
}

impl TestRelay {
    async fn start(stored: Vec<Event>, mode: RelayMode) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}", listener.local_addr().unwrap());
        let stored = Arc::new(Mutex::new(stored));
        let (live, _) = broadcast::channel(64);

        let server_stored = Arc::clone(&stored);
        let server_live = live.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let stored = Arc::clone(&server_stored);
                let live = server_live.subscribe();
                tokio::spawn(serve_connection(stream, stored, live, mode));
            }
        });

        Self { url, stored, live }
    }

    fn push_live(&self, event: Event) {
        let _ = self.live.send(event);
    }
}

async fn serve_connection(
    stream: tokio::net::TcpStream,
    stored: Arc<Mutex<Vec<Event>>>,
    mut live: broadcast::Receiver<Event>,
    mode: RelayMode,
) {
    let Ok(ws) = tokio_tungstenite::accept_async(stream).await else {
        return;
    };
    let (mut write, mut read) = ws.split();
    let mut subscriptions: Vec<(String, Filter)> = Vec::new();

    loop {
        tokio::select! {
            incoming = read.next() => {
                let Some(Ok(Message::Text(text))) = incoming else { return };
                let value: Value = serde_json::from_str(text.as_str()).unwrap();
                match value[0].as_str() {
                    Some("REQ") => {
                        let sub = value[1].as_str().unwrap().to_string();
                        let filter: Filter = serde_json::from_value(value[2].clone()).unwrap();
                        let matching: Vec<Event> =
                            stored.lock().iter().filter(|e| filter.matches(e)).cloned().collect();
                        for event in matching {
                            let frame = json!(["EVENT", sub, event]).to_string();
                            write.send(Message::Text(frame.into())).await.unwrap();
                        }
                        if mode.send_eose {
                            let frame = json!(["EOSE", sub]).to_string();
                            write.send(Message::Text(frame.into())).await.unwrap();
                        }
                        subscriptions.push((sub, filter));
                    }
                    Some("CLOSE") => {
                        let sub = value[1].as_str().unwrap_or_default();
                        subscriptions.retain(|(s, _)| s != sub);
                    }
                    Some("EVENT") => {
                        let event: Event = serde_json::from_value(value[1].clone()).unwrap();
                        let id = event.id.to_hex();
                        stored.lock().push(event);
                        if mode.ack_events {
                            let frame = json!(["OK", id, true, ""]).to_string();
                            write.send(Message::Text(frame.into())).await.unwrap();
                        }
                    }
                    _ => {}
                }
            }
            pushed = live.recv() => {
                let Ok(event) = pushed else { return };
                for (sub, filter) in &subscriptions {
                    if filter.matches(&event) {
                        let frame = json!(["EVENT", sub, event]).to_string();
                        write.send(Message::Text(frame.into())).await.unwrap();
                    }
                }
            }
        }
    }
}

fn keys() -> Keys {
    Keys::from_bytes(&[7u8; 32]).unwrap()
}

fn note(content: &str, created_at: u64) -> Event {
    EventBuilder::text_note(content)
        .created_at(created_at)
        .sign(&keys())
        .unwrap()
}

fn reply(content: &str, parent: &EventId) -> Event {
    EventBuilder::text_note(content)
        .created_at(200)
        .tag(Tag::event(parent, ""))
        .sign(&keys())
        .unwrap()
}

fn pool() -> Arc<RelayPool> {
    Arc::new(RelayPool::new(RelayPoolConfig::for_testing()))
}

#[tokio::test]
async fn test_fetch_merges_relays_and_dedups() {
    let root = note("root", 100);
    let shared = reply("shared", &root.id);
    let only_a = reply("only a", &root.id);
    let only_b = reply("only b", &root.id);

    let a = TestRelay::start(vec![shared.clone(), only_a.clone()], RelayMode::default()).await;
    let b = TestRelay::start(vec![shared.clone(), only_b.clone()], RelayMode::default()).await;

    let filter = Filter::new()
        .kinds([Kind::TEXT_NOTE])
        .referenced_events([root.id]);
    let events = pool()
        .fetch_all(&[a.url.clone(), b.url.clone()], &filter, &CancellationToken::new())
        .await;

    let mut ids: Vec<EventId> = events.iter().map(|e| e.id).collect();
    ids.sort_by_key(|id| id.to_hex());
    let mut expected = vec![shared.id, only_a.id, only_b.id];
    expected.sort_by_key(|id| id.to_hex());
    assert_eq!(ids, expected);
}

#[tokio::test]
async fn test_fetch_skips_unreachable_relay() {
    let event = note("hello", 100);
    let live = TestRelay::start(vec![event.clone()], RelayMode::default()).await;

    let events = pool()
        .fetch_all(
            &["ws://127.0.0.1:1".to_string(), live.url.clone()],
            &Filter::new().ids([event.id]),
            &CancellationToken::new(),
        )
        .await;
    assert_eq!(events, vec![event]);
}

#[tokio::test]
async fn test_fetch_is_bounded_without_eose() {
    let event = note("stored", 100);
    let relay = TestRelay::start(
        vec![event.clone()],
        RelayMode {
            send_eose: false,
            ..Default::default()
        },
    )
    .await;

    let started = std::time::Instant::now();
    let events = pool()
        .fetch_all(&[relay.url.clone()], &Filter::new(), &CancellationToken::new())
        .await;

    assert_eq!(events, vec![event]);
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[tokio::test]
async fn test_cancel_interrupts_fetch() {
    let relay = TestRelay::start(
        vec![],
        RelayMode {
            send_eose: false,
            ..Default::default()
        },
    )
    .await;
    let pool = Arc::new(RelayPool::new(RelayPoolConfig {
        fetch_timeout_ms: 60_000,
        ..RelayPoolConfig::for_testing()
    }));
    let cancel = CancellationToken::new();

    let fetch = {
        let pool = Arc::clone(&pool);
        let cancel = cancel.clone();
        let url = relay.url.clone();
        tokio::spawn(async move { pool.fetch_all(&[url], &Filter::new(), &cancel).await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;
    cancel.cancel();

    let events = tokio::time::timeout(Duration::from_secs(2), fetch)
        .await
        .unwrap()
        .unwrap();
    assert!(events.is_empty());
}

#[tokio::test]
async fn test_fetch_last_event_picks_newest() {
    let older = note("older", 100);
    let newer = note("newer", 300);
    let relay = TestRelay::start(vec![older, newer.clone()], RelayMode::default()).await;

    let last = pool()
        .fetch_last_event(&[relay.url.clone()], &Filter::new().kinds([Kind::TEXT_NOTE]))
        .await;
    assert_eq!(last, Some(newer));
}

#[tokio::test]
async fn test_publish_receives_ack() {
    let relay = TestRelay::start(vec![], RelayMode::default()).await;
    let event = note("publish me", 100);

    let ack = pool().publish(&relay.url, &event).await.unwrap();
    assert!(ack.accepted);
    assert_eq!(relay.stored.lock().clone(), vec![event]);
}

#[tokio::test]
async fn test_ensure_relay_reuses_connection() {
    let relay = TestRelay::start(vec![], RelayMode::default()).await;
    let pool = pool();

    let first = pool.ensure_relay(&relay.url).await.unwrap();
    let second = pool.ensure_relay(&relay.url).await.unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(pool.connected_relays(), vec![relay.url.clone()]);
}

#[tokio::test]
async fn test_closed_connection_is_replaced() {
    let relay = TestRelay::start(vec![], RelayMode::default()).await;
    let pool = pool();

    let first = pool.ensure_relay(&relay.url).await.unwrap();
    first.close();
    let second = pool.ensure_relay(&relay.url).await.unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    assert!(!second.is_closed());
}

#[tokio::test]
async fn test_live_subscription_dedups_across_relays() {
    let a = TestRelay::start(vec![], RelayMode::default()).await;
    let b = TestRelay::start(vec![], RelayMode::default()).await;
    let pool = pool();

    let mut rx = pool.subscribe(
        &[a.url.clone(), b.url.clone()],
        Filter::new().kinds([Kind::TEXT_NOTE]),
    );
    // Let both REQs reach their relays.
    tokio::time::sleep(Duration::from_millis(200)).await;

    let event = note("live", 500);
    a.push_live(event.clone());
    b.push_live(event.clone());

    let received = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .unwrap();
    assert_eq!(received, Some(event));

    let duplicate = tokio::time::timeout(Duration::from_millis(300), rx.recv()).await;
    assert!(duplicate.is_err());

    pool.shutdown();
}
