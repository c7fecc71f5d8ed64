//! # Root-Reference Classifier
//!
//! Decides whether a candidate is a reply to the current frontier or merely
//! references a frontier event as its thread root.
//!
//! The `e` tag convention is ambiguous when a note carries several references
//! and not every client writes markers, so the policy lives behind
//! [`ReplyClassifier`] and can be swapped for a stricter parser.
//!
//! ## Policy (applied in order)
//!
//! 1. At most one `e` tag: accept.
//! 2. The first `root`-marked tag points into the frontier: reject.
//! 3. The first `e` tag has no marker element and points into the frontier:
//!    reject (positional root with two or more tags).
//! 4. Otherwise accept.

use shared_types::{Event, Tag};

use super::entities::Frontier;

/// Classifies candidate replies against a frontier.
pub trait ReplyClassifier: Send + Sync {
    /// Must be a pure function of its inputs.
    fn is_genuine_reply(&self, event: &Event, frontier: &Frontier) -> bool;
}

/// Marker/position heuristic over NIP-10 `e` tags.
#[derive(Debug, Clone, Copy, Default)]
pub struct RootReferenceClassifier;

impl ReplyClassifier for RootReferenceClassifier {
    fn is_genuine_reply(&self, event: &Event, frontier: &Frontier) -> bool {
        let e_tags: Vec<&Tag> = event.event_tags().collect();
        if e_tags.len() <= 1 {
            return true;
        }

        let points_into_frontier =
            |tag: &Tag| tag.event_id().is_some_and(|id| frontier.contains(&id));

        if let Some(root) = e_tags.iter().find(|t| t.marker() == Some("root")) {
            if points_into_frontier(root) {
                return false;
            }
        }

        if let Some(first) = e_tags.first() {
            if first.marker().is_none() && points_into_frontier(first) {
                return false;
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{EventId, Kind, PublicKey, Signature};

    fn id(b: u8) -> EventId {
        EventId::from_bytes([b; 32])
    }

    fn note(tags: Vec<Tag>) -> Event {
        Event {
            id: id(0xEE),
            pubkey: PublicKey::from_bytes([1; 32]),
            created_at: 0,
            kind: Kind::TEXT_NOTE,
            tags,
            content: String::new(),
            sig: Signature::from_bytes([0; 64]),
        }
    }

    fn classify(tags: Vec<Tag>, frontier: &[EventId]) -> bool {
        RootReferenceClassifier.is_genuine_reply(&note(tags), &Frontier::from_ids(frontier.to_vec()))
    }

    #[test]
    fn test_single_unmarked_tag_is_accepted() {
        assert!(classify(vec![Tag::event(&id(1), "")], &[id(1)]));
    }

    #[test]
    fn test_single_root_marked_tag_is_accepted() {
        // Direct reply to a thread root carries only the root tag.
        assert!(classify(
            vec![Tag::event_with_marker(&id(1), "", "root")],
            &[id(1)]
        ));
    }

    #[test]
    fn test_root_marker_into_frontier_is_rejected() {
        let tags = vec![
            Tag::event_with_marker(&id(1), "", "root"),
            Tag::event_with_marker(&id(2), "", "reply"),
        ];
        assert!(!classify(tags, &[id(1)]));
    }

    #[test]
    fn test_reply_marker_into_frontier_is_accepted() {
        let tags = vec![
            Tag::event_with_marker(&id(1), "", "root"),
            Tag::event_with_marker(&id(2), "", "reply"),
        ];
        assert!(classify(tags, &[id(2)]));
    }

    #[test]
    fn test_positional_root_into_frontier_is_rejected() {
        let tags = vec![Tag::event(&id(1), ""), Tag::event(&id(2), "")];
        assert!(!classify(tags, &[id(1)]));
    }

    #[test]
    fn test_positional_reply_into_frontier_is_accepted() {
        let tags = vec![Tag::event(&id(1), ""), Tag::event(&id(2), "")];
        assert!(classify(tags, &[id(2)]));
    }

    #[test]
    fn test_empty_marker_is_not_positional_root() {
        // A present-but-empty marker element counts as marked.
        let tags = vec![
            Tag::event_with_marker(&id(1), "", ""),
            Tag::event(&id(2), ""),
        ];
        assert!(classify(tags, &[id(1)]));
    }

    #[test]
    fn test_non_e_tags_do_not_count() {
        let tags = vec![
            Tag::pubkey(&PublicKey::from_bytes([9; 32]), ""),
            Tag::event(&id(1), ""),
        ];
        assert!(classify(tags, &[id(1)]));
    }

    #[test]
    fn test_classifier_is_deterministic() {
        let tags = vec![Tag::event(&id(1), ""), Tag::event(&id(2), "")];
        let event = note(tags);
        let frontier = Frontier::from_ids([id(1), id(2)]);
        let first = RootReferenceClassifier.is_genuine_reply(&event, &frontier);
        for _ in 0..10 {
            assert_eq!(
                RootReferenceClassifier.is_genuine_reply(&event, &frontier),
                first
            );
        }
    }
}
