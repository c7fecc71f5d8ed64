//! # Multi-Endpoint Broadcast
//!
//! Sends one event to many relays at once. Each endpoint gets its own
//! timeout covering connect, submit and acknowledgement, so the whole
//! broadcast finishes within roughly one timeout.

use std::time::Duration;

use futures::future::join_all;
use shared_types::Event;
use tracing::{debug, warn};

use crate::domain::{EndpointResult, EndpointStatus, PublishOutcome, PublishReport, ReplyTreeError};
use crate::ports::RelayConnector;

/// Publish `event` to every endpoint concurrently and report per-endpoint
/// results. Failures never propagate.
pub async fn publish_to_endpoints<C>(
    connector: &C,
    event: &Event,
    endpoints: &[String],
    per_endpoint_timeout: Duration,
) -> PublishReport
where
    C: RelayConnector + ?Sized,
{
    let attempts = endpoints.iter().map(|url| async move {
        let status = match tokio::time::timeout(
            per_endpoint_timeout,
            submit_to(connector, url, event),
        )
        .await
        {
            Ok(Ok(PublishOutcome::Accepted)) => EndpointStatus::Accepted,
            Ok(Ok(PublishOutcome::Rejected(reason))) => EndpointStatus::Rejected(reason),
            Ok(Err(e)) => EndpointStatus::Failed(e.to_string()),
            Err(_) => EndpointStatus::TimedOut,
        };

        match &status {
            EndpointStatus::Accepted => {
                debug!(relay = %url, event_id = %event.id, "[rc-02] Event accepted")
            }
            EndpointStatus::Rejected(reason) => {
                warn!(relay = %url, event_id = %event.id, %reason, "[rc-02] Event rejected")
            }
            EndpointStatus::Failed(error) => {
                warn!(relay = %url, event_id = %event.id, %error, "[rc-02] Publish failed")
            }
            EndpointStatus::TimedOut => {
                warn!(relay = %url, event_id = %event.id, "[rc-02] Publish timed out")
            }
        }

        EndpointResult {
            url: url.clone(),
            status,
        }
    });

    PublishReport {
        event_id: event.id,
        endpoints: join_all(attempts).await,
    }
}

async fn submit_to<C>(
    connector: &C,
    url: &str,
    event: &Event,
) -> Result<PublishOutcome, ReplyTreeError>
where
    C: RelayConnector + ?Sized,
{
    let handle = connector.ensure_connection(url).await?;
    handle.submit(event).await
}
