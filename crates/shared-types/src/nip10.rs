//! # Thread References (NIP-10)
//!
//! Resolves which events a note replies to from its `e` tags.
//!
//! Marked tags (`root`, `reply`, `mention`) take precedence. Unmarked tags are
//! positional: the first is the root, the last is the reply target, anything in
//! between is a mention. A single unmarked tag is therefore the root.

use crate::entities::{Event, EventId};

/// A referenced event plus its relay hint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventPointer {
    pub id: EventId,
    pub relays: Vec<String>,
}

/// Thread structure of a note.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThreadRefs {
    pub root: Option<EventPointer>,
    pub reply: Option<EventPointer>,
    pub mentions: Vec<EventPointer>,
}

/// Parse the thread references of an event.
pub fn parse_thread(event: &Event) -> ThreadRefs {
    let e_tags: Vec<_> = event.event_tags().collect();
    let mut refs = ThreadRefs::default();

    for (idx, tag) in e_tags.iter().enumerate() {
        let Some(id) = tag.event_id() else {
            continue;
        };
        let relays = match tag.relay_hint() {
            Some(url) if !url.is_empty() => vec![url.to_string()],
            _ => Vec::new(),
        };
        let pointer = EventPointer { id, relays };

        match tag.marker() {
            Some("root") => refs.root = Some(pointer),
            Some("reply") => refs.reply = Some(pointer),
            Some("mention") => refs.mentions.push(pointer),
            _ if idx == 0 => refs.root = Some(pointer),
            _ if idx == e_tags.len() - 1 => refs.reply = Some(pointer),
            _ => refs.mentions.push(pointer),
        }
    }

    refs
}

/// The event a note directly replies to: its reply target, else its root.
pub fn direct_reply_target(event: &Event) -> Option<EventId> {
    let refs = parse_thread(event);
    refs.reply.or(refs.root).map(|p| p.id)
}
