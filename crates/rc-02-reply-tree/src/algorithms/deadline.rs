//! # Deadline Coordination
//!
//! Races a measurement against a timer. When the timer wins, the shared
//! cancellation token fires so in-flight relay queries stop, and the
//! measurement future is dropped. Partial results are discarded.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::domain::{MeasureReplyTreeResult, ReplyTreeMeasurement};

/// Run `measurement` until it finishes or `timeout` elapses.
pub async fn with_deadline<Fut>(
    timeout: Duration,
    cancel: &CancellationToken,
    measurement: Fut,
) -> MeasureReplyTreeResult
where
    Fut: Future<Output = ReplyTreeMeasurement>,
{
    tokio::select! {
        m = measurement => MeasureReplyTreeResult::Ok(m),
        _ = tokio::time::sleep(timeout) => {
            cancel.cancel();
            info!(timeout_ms = timeout.as_millis() as u64, "[rc-02] Measurement timed out");
            MeasureReplyTreeResult::TimedOut
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_fast_measurement_wins() {
        let cancel = CancellationToken::new();
        let result = with_deadline(Duration::from_secs(5), &cancel, async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            ReplyTreeMeasurement { depth: 2, leaves: 3 }
        })
        .await;
        assert_eq!(
            result,
            MeasureReplyTreeResult::Ok(ReplyTreeMeasurement { depth: 2, leaves: 3 })
        );
        assert!(!cancel.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_measurement_times_out_and_cancels() {
        let cancel = CancellationToken::new();
        let finished = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&finished);
        let started = tokio::time::Instant::now();

        let result = with_deadline(Duration::from_secs(2), &cancel, async move {
            tokio::time::sleep(Duration::from_secs(10)).await;
            flag.store(true, Ordering::SeqCst);
            ReplyTreeMeasurement::default()
        })
        .await;

        assert_eq!(result, MeasureReplyTreeResult::TimedOut);
        assert!(cancel.is_cancelled());
        assert!(started.elapsed() >= Duration::from_secs(2));
        assert!(started.elapsed() < Duration::from_secs(3));

        // The losing future was dropped and never resumes.
        tokio::time::sleep(Duration::from_secs(20)).await;
        assert!(!finished.load(Ordering::SeqCst));
    }
}
