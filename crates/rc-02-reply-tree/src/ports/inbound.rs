//! # Inbound Ports
//!
//! API exposed to the trigger handler.

use std::time::Duration;

use async_trait::async_trait;
use shared_types::{Event, EventId};

use crate::domain::{MeasureReplyTreeResult, PublishReport, ReplyTreeError};

/// Reply-tree API - inbound port.
#[async_trait]
pub trait ReplyTreeApi: Send + Sync {
    /// Fetch the newest copy of `target` from the read relays.
    ///
    /// Fails with `TargetNotFound` when no relay holds it and with
    /// `TargetNotTextNote` when it is not kind 1.
    async fn fetch_target(&self, target: EventId) -> Result<Event, ReplyTreeError>;

    /// Measure the reply tree under `target`, bounded by the configured
    /// deadline.
    async fn measure_reply_tree(&self, target: EventId) -> MeasureReplyTreeResult;

    /// Submit `event` to every endpoint concurrently.
    ///
    /// Returns within roughly `per_endpoint_timeout` regardless of how many
    /// endpoints are slow or unreachable. Never fails as a whole.
    async fn publish_to_endpoints(
        &self,
        event: &Event,
        endpoints: &[String],
        per_endpoint_timeout: Duration,
    ) -> PublishReport;
}
