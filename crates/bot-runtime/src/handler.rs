//! # Trigger Handler
//!
//! One trigger, start to finish:
//!
//! 1. Detect the trigger and its target.
//! 2. Claim the target in the in-flight registry.
//! 3. Fetch the target; it must exist and be a text note.
//! 4. Publish the 👌 acknowledgement.
//! 5. Measure under the deadline.
//! 6. Publish the result or the timeout apology.
//!
//! The target is released when the guard from step 2 drops, whichever way
//! the handler exits.

use std::time::Duration;

use rc_02_reply_tree::{MeasureReplyTreeResult, ReplyTreeApi, ReplyTreeError, ReplyTreeMeasurement};
use shared_types::{Event, NostrError};
use thiserror::Error;
use tracing::{debug, info};

use crate::composer::ResponseComposer;
use crate::registry::InFlightRegistry;
use crate::trigger::{IgnoreReason, TriggerDetector};

/// Failures that abort a trigger without a response.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("Failed to sign response: {0}")]
    Signing(#[from] NostrError),

    #[error("Reply-tree error: {0}")]
    ReplyTree(#[from] ReplyTreeError),
}

/// How a trigger was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerOutcome {
    Ignored(IgnoreReason),
    AlreadyMeasuring,
    TargetNotFound,
    TargetNotTextNote,
    Measured(ReplyTreeMeasurement),
    TimedOut,
}

/// Handles triggers against a reply-tree API.
pub struct TriggerHandler<A: ReplyTreeApi> {
    api: A,
    detector: TriggerDetector,
    registry: InFlightRegistry,
    composer: ResponseComposer,
    write_relays: Vec<String>,
    publish_timeout: Duration,
}

impl<A: ReplyTreeApi> TriggerHandler<A> {
    pub fn new(
        api: A,
        detector: TriggerDetector,
        composer: ResponseComposer,
        write_relays: Vec<String>,
        publish_timeout: Duration,
    ) -> Self {
        Self {
            api,
            detector,
            registry: InFlightRegistry::new(),
            composer,
            write_relays,
            publish_timeout,
        }
    }

    pub fn registry(&self) -> &InFlightRegistry {
        &self.registry
    }

    /// Cheap pre-check used before spawning a task for an event.
    pub fn is_trigger(&self, event: &Event) -> bool {
        self.detector.detect(event).is_ok()
    }

    pub async fn handle(&self, trigger: &Event) -> Result<HandlerOutcome, HandlerError> {
        let target_id = match self.detector.detect(trigger) {
            Ok(id) => id,
            Err(reason) => {
                debug!(trigger = %trigger.id, %reason, "Ignoring event");
                return Ok(HandlerOutcome::Ignored(reason));
            }
        };
        info!(trigger = %trigger.id, target_id = %target_id, author = %trigger.pubkey, "Trigger received");

        let Some(_guard) = self.registry.try_acquire(target_id) else {
            info!(target_id = %target_id, "This event is already being measured");
            return Ok(HandlerOutcome::AlreadyMeasuring);
        };

        let target = match self.api.fetch_target(target_id).await {
            Ok(event) => event,
            Err(ReplyTreeError::TargetNotFound(_)) => {
                info!(target_id = %target_id, "Target event not found");
                return Ok(HandlerOutcome::TargetNotFound);
            }
            Err(ReplyTreeError::TargetNotTextNote { kind, .. }) => {
                info!(target_id = %target_id, %kind, "Target event is not a text note");
                return Ok(HandlerOutcome::TargetNotTextNote);
            }
            Err(e) => return Err(e.into()),
        };

        let accepted = self.composer.accepted_reaction(trigger)?;
        self.publish(&accepted).await;

        let (response, outcome) = match self.api.measure_reply_tree(target_id).await {
            MeasureReplyTreeResult::Ok(measurement) => {
                info!(
                    target_id = %target_id,
                    depth = measurement.depth,
                    leaves = measurement.leaves,
                    "Measurement finished"
                );
                (
                    self.composer.measurement_result(trigger, &target, &measurement)?,
                    HandlerOutcome::Measured(measurement),
                )
            }
            MeasureReplyTreeResult::TimedOut => {
                info!(target_id = %target_id, "Measurement timed out");
                (
                    self.composer.timeout_apology(trigger)?,
                    HandlerOutcome::TimedOut,
                )
            }
        };
        self.publish(&response).await;

        Ok(outcome)
    }

    async fn publish(&self, event: &Event) {
        let report = self
            .api
            .publish_to_endpoints(event, &self.write_relays, self.publish_timeout)
            .await;
        debug!(
            event_id = %event.id,
            accepted = report.accepted_count(),
            endpoints = report.endpoints.len(),
            "Published"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rc_02_reply_tree::{InMemoryRelay, MeasureConfig, MockRelayBehavior, MockRelayConnector, ReplyTreeService};
    use shared_types::{EventBuilder, Keys, Kind, Tag};
    use std::sync::Arc;

    type Service = ReplyTreeService<InMemoryRelay, MockRelayConnector>;

    const WRITE: &str = "wss://write.test";

    fn keys(b: u8) -> Keys {
        Keys::from_bytes(&[b; 32]).unwrap()
    }

    fn handler(relay: InMemoryRelay, connector: Arc<MockRelayConnector>) -> TriggerHandler<Service> {
        let bot = keys(1);
        let service = ReplyTreeService::new(MeasureConfig::for_testing(), Arc::new(relay), connector);
        TriggerHandler::new(
            service,
            TriggerDetector::new("連鎖数", [bot.public_key()].into()),
            ResponseComposer::new(bot),
            vec![WRITE.to_string()],
            Duration::from_secs(1),
        )
    }

    fn connector() -> Arc<MockRelayConnector> {
        Arc::new(MockRelayConnector::new().with_relay(WRITE, MockRelayBehavior::Accept))
    }

    fn trigger_for(target: &Event) -> Event {
        EventBuilder::text_note("連鎖数")
            .tag(Tag::event(&target.id, ""))
            .sign(&keys(2))
            .unwrap()
    }

    #[tokio::test]
    async fn test_ignored_event_publishes_nothing() {
        let connector = connector();
        let h = handler(InMemoryRelay::new(), Arc::clone(&connector));
        let plain = EventBuilder::text_note("hello").sign(&keys(2)).unwrap();

        let outcome = h.handle(&plain).await.unwrap();
        assert_eq!(outcome, HandlerOutcome::Ignored(IgnoreReason::NoTriggerPhrase));
        assert!(connector.submitted().is_empty());
    }

    #[tokio::test]
    async fn test_missing_target_publishes_nothing() {
        let connector = connector();
        let h = handler(InMemoryRelay::new(), Arc::clone(&connector));
        let target = EventBuilder::text_note("gone").sign(&keys(3)).unwrap();

        let outcome = h.handle(&trigger_for(&target)).await.unwrap();
        assert_eq!(outcome, HandlerOutcome::TargetNotFound);
        assert!(connector.submitted().is_empty());
        assert!(h.registry().is_empty());
    }

    #[tokio::test]
    async fn test_wrong_kind_target_publishes_nothing() {
        let connector = connector();
        let target = EventBuilder::new(Kind::REACTION, "+").sign(&keys(3)).unwrap();
        let h = handler(InMemoryRelay::new().with_events([target.clone()]), Arc::clone(&connector));

        let outcome = h.handle(&trigger_for(&target)).await.unwrap();
        assert_eq!(outcome, HandlerOutcome::TargetNotTextNote);
        assert!(connector.submitted().is_empty());
    }

    #[tokio::test]
    async fn test_zero_depth_sends_ack_and_reaction() {
        let connector = connector();
        let target = EventBuilder::text_note("lonely").sign(&keys(3)).unwrap();
        let trigger = trigger_for(&target);
        let h = handler(InMemoryRelay::new().with_events([target]), Arc::clone(&connector));

        let outcome = h.handle(&trigger).await.unwrap();
        assert_eq!(outcome, HandlerOutcome::Measured(ReplyTreeMeasurement::default()));

        let published = connector.submitted_to(WRITE);
        let contents: Vec<&str> = published.iter().map(|e| e.content.as_str()).collect();
        assert_eq!(contents, vec!["👌", "0️⃣"]);
        assert!(h.registry().is_empty());
    }
}
