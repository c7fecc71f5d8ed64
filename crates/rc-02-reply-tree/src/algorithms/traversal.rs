//! # Reply-Tree Traversal
//!
//! Level-order walk down a reply tree, one multi-relay query per level.
//!
//! ```text
//! frontier = {target}
//! loop:
//!     candidates = fetch(kind 1, #e ∈ frontier)
//!     replies    = candidates − counted − excluded authors − root references
//!     if replies = ∅: stop
//!     depth += 1; leaves += |replies|; counted ∪= replies; frontier = replies
//! ```
//!
//! An event is counted at most once, in the first round that finds it.

use std::collections::HashSet;

use shared_types::{Event, EventId, Filter, Kind};
use tracing::{debug, trace};

use crate::domain::{Frontier, ReplyClassifier, ReplyTreeMeasurement, TraversalContext};
use crate::ports::EventFetcher;

/// Filter for one round: text notes referencing any frontier event.
pub fn reply_round_filter(frontier: &Frontier) -> Filter {
    Filter::new()
        .kinds([Kind::TEXT_NOTE])
        .referenced_events(frontier.ids().iter().copied())
}

/// Walk the tree under `target` until a round yields no genuine reply.
///
/// Returns early with the rounds counted so far when `ctx.cancel` fires. A
/// round whose fetch was interrupted is not counted.
pub async fn measure_reply_tree<F, C>(
    fetcher: &F,
    classifier: &C,
    target: EventId,
    ctx: &TraversalContext,
) -> ReplyTreeMeasurement
where
    F: EventFetcher + ?Sized,
    C: ReplyClassifier + ?Sized,
{
    let mut measurement = ReplyTreeMeasurement::default();
    let mut frontier = Frontier::root(target);
    let mut counted: HashSet<EventId> = HashSet::new();

    loop {
        let filter = reply_round_filter(&frontier);
        let candidates = fetcher
            .fetch_all(&ctx.read_relays, &filter, &ctx.cancel)
            .await;

        if ctx.cancel.is_cancelled() {
            debug!(
                target_id = %target,
                depth = measurement.depth,
                "[rc-02] Traversal cancelled"
            );
            return measurement;
        }

        let replies: Vec<&Event> = candidates
            .iter()
            .filter(|e| !counted.contains(&e.id))
            .filter(|e| !ctx.is_excluded(&e.pubkey))
            .filter(|e| classifier.is_genuine_reply(e, &frontier))
            .collect();

        trace!(
            frontier = frontier.len(),
            candidates = candidates.len(),
            replies = replies.len(),
            "[rc-02] Round complete"
        );

        if replies.is_empty() {
            debug!(
                target_id = %target,
                depth = measurement.depth,
                leaves = measurement.leaves,
                "[rc-02] Traversal finished"
            );
            return measurement;
        }

        frontier = Frontier::from_events(replies);
        counted.extend(frontier.ids().iter().copied());
        measurement.record_round(frontier.len());
    }
}
