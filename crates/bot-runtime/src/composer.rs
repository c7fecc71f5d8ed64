//! # Response Composer
//!
//! Builds and signs every event the bot publishes.
//!
//! | Situation | Kind | Content |
//! |-----------|------|---------|
//! | Trigger accepted | 7 | `👌` |
//! | Depth 0 / 1 | 7 | `0️⃣` / `1️⃣` |
//! | Depth ≥ 2 | 1 | depth, total and a `nostr:nevent1...` quote of the target |
//! | Timed out | 1 | `タイムアウトしました…` |

use rc_02_reply_tree::ReplyTreeMeasurement;
use shared_types::{encode_nevent, Event, EventBuilder, Keys, NostrError, Tag};

pub const ACCEPTED_REACTION: &str = "👌";
pub const DEPTH_ZERO_REACTION: &str = "0️⃣";
pub const DEPTH_ONE_REACTION: &str = "1️⃣";
pub const TIMEOUT_MESSAGE: &str = "タイムアウトしました…";

/// Signs responses with the bot's keys.
#[derive(Clone)]
pub struct ResponseComposer {
    keys: Keys,
}

impl ResponseComposer {
    pub fn new(keys: Keys) -> Self {
        Self { keys }
    }

    pub fn keys(&self) -> &Keys {
        &self.keys
    }

    /// Immediate acknowledgement of a trigger.
    pub fn accepted_reaction(&self, trigger: &Event) -> Result<Event, NostrError> {
        self.reaction(trigger, ACCEPTED_REACTION)
    }

    /// Result for a finished measurement. Shallow trees get a reaction,
    /// deeper ones a reply quoting the target.
    pub fn measurement_result(
        &self,
        trigger: &Event,
        target: &Event,
        measurement: &ReplyTreeMeasurement,
    ) -> Result<Event, NostrError> {
        match measurement.depth {
            0 => self.reaction(trigger, DEPTH_ZERO_REACTION),
            1 => self.reaction(trigger, DEPTH_ONE_REACTION),
            depth => {
                let nevent = encode_nevent(&target.id, &[], None)?;
                let content = format!(
                    "リプライ連鎖数: {depth}{}\nリプライ総数: {}\nnostr:{nevent}",
                    "！".repeat(depth as usize),
                    measurement.leaves,
                );

                let mut tags = vec![Tag::pubkey(&trigger.pubkey, "")];
                if target.pubkey != trigger.pubkey {
                    tags.push(Tag::pubkey(&target.pubkey, ""));
                }
                tags.push(Tag::event_with_marker(&trigger.id, "", "reply"));
                tags.push(Tag::event_with_marker(&target.id, "", "mention"));

                EventBuilder::text_note(content).tags(tags).sign(&self.keys)
            }
        }
    }

    /// Reply sent when the measurement deadline fires.
    pub fn timeout_apology(&self, trigger: &Event) -> Result<Event, NostrError> {
        EventBuilder::text_note(TIMEOUT_MESSAGE)
            .tag(Tag::pubkey(&trigger.pubkey, ""))
            .tag(Tag::event_with_marker(&trigger.id, "", "root"))
            .sign(&self.keys)
    }

    fn reaction(&self, to: &Event, content: &str) -> Result<Event, NostrError> {
        EventBuilder::reaction(content)
            .tag(Tag::pubkey(&to.pubkey, ""))
            .tag(Tag::event(&to.id, ""))
            .sign(&self.keys)
    }
}
