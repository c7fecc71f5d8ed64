//! # Reply-Tree Service
//!
//! Application service wiring the traversal, deadline and broadcast
//! algorithms to the relay ports.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use shared_types::{Event, EventId, Filter};
use tracing::debug;

use crate::algorithms::{measure_reply_tree, publish_to_endpoints, with_deadline};
use crate::config::MeasureConfig;
use crate::domain::{
    MeasureReplyTreeResult, PublishReport, ReplyClassifier, ReplyTreeError,
    RootReferenceClassifier, TraversalContext,
};
use crate::ports::{EventFetcher, RelayConnector, ReplyTreeApi};

/// Reply-Tree Service - measures reply trees and broadcasts events.
pub struct ReplyTreeService<F: EventFetcher, C: RelayConnector> {
    config: MeasureConfig,
    fetcher: Arc<F>,
    connector: Arc<C>,
    classifier: Arc<dyn ReplyClassifier>,
}

impl<F: EventFetcher, C: RelayConnector> ReplyTreeService<F, C> {
    /// Create a service using the root-reference classifier.
    pub fn new(config: MeasureConfig, fetcher: Arc<F>, connector: Arc<C>) -> Self {
        Self {
            config,
            fetcher,
            connector,
            classifier: Arc::new(RootReferenceClassifier),
        }
    }

    /// Swap the reply classifier.
    pub fn with_classifier(mut self, classifier: Arc<dyn ReplyClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn config(&self) -> &MeasureConfig {
        &self.config
    }
}

#[async_trait]
impl<F: EventFetcher, C: RelayConnector> ReplyTreeApi for ReplyTreeService<F, C> {
    async fn fetch_target(&self, target: EventId) -> Result<Event, ReplyTreeError> {
        let filter = Filter::new().ids([target]);
        let event = self
            .fetcher
            .fetch_last_event(&self.config.read_relays, &filter)
            .await
            .ok_or(ReplyTreeError::TargetNotFound(target))?;

        if !event.is_text_note() {
            return Err(ReplyTreeError::TargetNotTextNote {
                id: target,
                kind: event.kind,
            });
        }
        Ok(event)
    }

    async fn measure_reply_tree(&self, target: EventId) -> MeasureReplyTreeResult {
        let ctx = TraversalContext::new(
            self.config.read_relays.clone(),
            self.config.excluded_authors.clone(),
        );
        debug!(target_id = %target, relays = ctx.read_relays.len(), "[rc-02] Measuring reply tree");

        with_deadline(
            self.config.timeout,
            &ctx.cancel,
            measure_reply_tree(self.fetcher.as_ref(), self.classifier.as_ref(), target, &ctx),
        )
        .await
    }

    async fn publish_to_endpoints(
        &self,
        event: &Event,
        endpoints: &[String],
        per_endpoint_timeout: Duration,
    ) -> PublishReport {
        publish_to_endpoints(self.connector.as_ref(), event, endpoints, per_endpoint_timeout).await
    }
}
