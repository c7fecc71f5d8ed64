//! # Trigger Detection
//!
//! A trigger is a text note containing the trigger phrase, written by a
//! human, that replies to another note. The note it replies to is the
//! measurement target.

use std::collections::HashSet;
use std::fmt;

use shared_types::{direct_reply_target, Event, EventId, PublicKey};

/// Why an event was not treated as a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    NotTextNote,
    NoTriggerPhrase,
    BotAuthor,
    NotAReply,
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::NotTextNote => "not a text note",
            Self::NoTriggerPhrase => "no trigger phrase",
            Self::BotAuthor => "triggering by bot is not allowed",
            Self::NotAReply => "not a reply",
        };
        f.write_str(reason)
    }
}

/// Recognizes measurement requests.
#[derive(Debug, Clone)]
pub struct TriggerDetector {
    phrase: String,
    bot_authors: HashSet<PublicKey>,
}

impl TriggerDetector {
    /// `bot_authors` should include the bot's own key.
    pub fn new(phrase: impl Into<String>, bot_authors: HashSet<PublicKey>) -> Self {
        Self {
            phrase: phrase.into(),
            bot_authors,
        }
    }

    /// The measurement target of `event`, or why it is not a trigger.
    pub fn detect(&self, event: &Event) -> Result<EventId, IgnoreReason> {
        if !event.is_text_note() {
            return Err(IgnoreReason::NotTextNote);
        }
        if !event.content.contains(&self.phrase) {
            return Err(IgnoreReason::NoTriggerPhrase);
        }
        if self.bot_authors.contains(&event.pubkey) {
            return Err(IgnoreReason::BotAuthor);
        }
        direct_reply_target(event).ok_or(IgnoreReason::NotAReply)
    }
}
