//! # Bech32 Entities (NIP-19)
//!
//! `nevent` encoding, used to link the measured note in result replies.
//!
//! TLV layout: type `0` = 32-byte event id, type `1` = relay URL (repeatable),
//! type `2` = 32-byte author key.

use bech32::{Bech32, Hrp};

use crate::entities::{EventId, PublicKey};
use crate::errors::NostrError;

const NEVENT_HRP: &str = "nevent";

const TLV_SPECIAL: u8 = 0;
const TLV_RELAY: u8 = 1;
const TLV_AUTHOR: u8 = 2;

/// Encode an event pointer as `nevent1...`.
pub fn encode_nevent(
    id: &EventId,
    relays: &[String],
    author: Option<&PublicKey>,
) -> Result<String, NostrError> {
    let mut tlv = Vec::with_capacity(34);
    push_tlv(&mut tlv, TLV_SPECIAL, id.as_bytes())?;
    for relay in relays {
        push_tlv(&mut tlv, TLV_RELAY, relay.as_bytes())?;
    }
    if let Some(author) = author {
        push_tlv(&mut tlv, TLV_AUTHOR, author.as_bytes())?;
    }

    let hrp = Hrp::parse(NEVENT_HRP).map_err(|e| NostrError::Bech32(e.to_string()))?;
    bech32::encode::<Bech32>(hrp, &tlv).map_err(|e| NostrError::Bech32(e.to_string()))
}

/// Decode the event id from an `nevent1...` string.
pub fn decode_nevent(encoded: &str) -> Result<EventId, NostrError> {
    let (hrp, data) = bech32::decode(encoded).map_err(|e| NostrError::Bech32(e.to_string()))?;
    let expected = Hrp::parse(NEVENT_HRP).map_err(|e| NostrError::Bech32(e.to_string()))?;
    if hrp != expected {
        return Err(NostrError::Bech32(format!("unexpected prefix: {hrp}")));
    }

    let mut rest = data.as_slice();
    while let [kind, len, tail @ ..] = rest {
        let len = *len as usize;
        if tail.len() < len {
            break;
        }
        let (value, next) = tail.split_at(len);
        if *kind == TLV_SPECIAL {
            return EventId::from_slice(value);
        }
        rest = next;
    }
    Err(NostrError::Bech32("missing event id".to_string()))
}

fn push_tlv(out: &mut Vec<u8>, kind: u8, value: &[u8]) -> Result<(), NostrError> {
    let len = u8::try_from(value.len()).map_err(|_| NostrError::InvalidLength {
        expected: u8::MAX as usize,
        got: value.len(),
    })?;
    out.push(kind);
    out.push(len);
    out.extend_from_slice(value);
    Ok(())
}
