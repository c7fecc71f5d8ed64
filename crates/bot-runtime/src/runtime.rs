//! # Bot Runtime
//!
//! Wires the relay pool into the reply-tree service, listens for new text
//! notes on the read relays and hands each trigger to its own task.
//!
//! ## Startup Sequence
//!
//! 1. Validate configuration
//! 2. Build the relay pool, port adapters and reply-tree service
//! 3. Subscribe to `kinds=[1], since=now` on the read relays
//! 4. Spawn the event loop
//!
//! Shutdown flips a watch channel the event loop selects on, then closes the
//! relay pool.

use std::sync::Arc;
use std::time::Duration;

use rc_01_relay_pool::RelayPool;
use rc_02_reply_tree::{ReplyTreeApi, ReplyTreeService};
use shared_types::{unix_time, Event, Filter, Kind};
use tokio::sync::{mpsc, watch};
use tracing::{error, info, trace};

use crate::adapters::{RelayPoolConnector, RelayPoolFetcher};
use crate::composer::ResponseComposer;
use crate::config::{BotConfig, ConfigError};
use crate::handler::{HandlerOutcome, TriggerHandler};
use crate::trigger::TriggerDetector;

/// The reply-tree service as wired in production.
pub type PooledReplyTreeService = ReplyTreeService<RelayPoolFetcher, RelayPoolConnector>;

/// The running bot.
pub struct BotRuntime {
    config: BotConfig,
    pool: Arc<RelayPool>,
    handler: Arc<TriggerHandler<PooledReplyTreeService>>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl BotRuntime {
    pub fn new(config: BotConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let keys = config.keys()?;
        let own = keys.public_key();
        info!(pubkey = %own, "Creating reply-chain bot runtime");

        let pool = Arc::new(RelayPool::new(config.pool.clone()));
        let service = ReplyTreeService::new(
            config.measure_config(own)?,
            Arc::new(RelayPoolFetcher::new(Arc::clone(&pool))),
            Arc::new(RelayPoolConnector::new(Arc::clone(&pool))),
        );

        let mut bot_authors = config.bot_pubkey_set()?;
        bot_authors.insert(own);
        let handler = TriggerHandler::new(
            service,
            TriggerDetector::new(config.trigger_phrase.clone(), bot_authors),
            ResponseComposer::new(keys),
            config.relay.write.clone(),
            config.publish_timeout(),
        );

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Ok(Self {
            config,
            pool,
            handler: Arc::new(handler),
            shutdown_tx,
            shutdown_rx,
        })
    }

    /// Subscribe to the read relays and start handling triggers.
    pub fn start(&self) {
        let filter = Filter::new().kinds([Kind::TEXT_NOTE]).since(unix_time());
        let events = self.pool.subscribe(&self.config.relay.read, filter);

        tokio::spawn(run_event_loop(
            Arc::clone(&self.handler),
            events,
            self.shutdown_rx.clone(),
        ));

        info!(
            read = ?self.config.relay.read,
            write = ?self.config.relay.write,
            timeout_secs = self.config.timeout_secs,
            "Reply-chain bot started"
        );
    }

    /// Stop the event loop and close every relay connection.
    pub async fn shutdown(&self) {
        info!("Initiating graceful shutdown...");
        if let Err(e) = self.shutdown_tx.send(true) {
            error!("Failed to send shutdown signal: {}", e);
        }
        self.pool.shutdown();

        // Let in-flight publishes drain.
        tokio::time::sleep(Duration::from_millis(500)).await;
        info!("Shutdown complete");
    }
}

/// Consume `events` until the channel closes or shutdown is signalled,
/// spawning one task per trigger.
pub async fn run_event_loop<A>(
    handler: Arc<TriggerHandler<A>>,
    mut events: mpsc::Receiver<Event>,
    mut shutdown: watch::Receiver<bool>,
) where
    A: ReplyTreeApi + 'static,
{
    loop {
        tokio::select! {
            next = events.recv() => match next {
                Some(event) => {
                    if handler.is_trigger(&event) {
                        spawn_trigger(Arc::clone(&handler), event);
                    } else {
                        trace!(event_id = %event.id, "Not a trigger");
                    }
                }
                None => {
                    info!("Event stream ended");
                    break;
                }
            },
            _ = shutdown.changed() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }
}

fn spawn_trigger<A>(handler: Arc<TriggerHandler<A>>, trigger: Event)
where
    A: ReplyTreeApi + 'static,
{
    tokio::spawn(async move {
        match handler.handle(&trigger).await {
            Ok(HandlerOutcome::Ignored(_)) => {}
            Ok(outcome) => info!(trigger = %trigger.id, ?outcome, "Trigger handled"),
            Err(e) => error!(trigger = %trigger.id, error = %e, "Trigger failed"),
        }
    });
}
