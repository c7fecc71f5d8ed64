//! # Core Domain Entities
//!
//! Defines the Nostr entities as specified in NIP-01.
//!
//! ## Clusters
//!
//! - **Identity**: `EventId`, `PublicKey`, `Signature`
//! - **Content**: `Event`, `Kind`, `Tag`

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::errors::NostrError;

// =============================================================================
// CLUSTER A: IDENTITY
// =============================================================================

macro_rules! hex_bytes_newtype {
    ($(#[$meta:meta])* $name:ident, $len:expr) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name([u8; $len]);

        impl $name {
            /// Byte length of this value.
            pub const LEN: usize = $len;

            /// Wrap raw bytes.
            pub const fn from_bytes(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            /// Borrow the raw bytes.
            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            /// Lowercase hex encoding.
            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }

            /// Decode from hex (either case).
            pub fn from_hex(s: &str) -> Result<Self, NostrError> {
                if s.len() != $len * 2 {
                    return Err(NostrError::InvalidLength {
                        expected: $len,
                        got: s.len() / 2,
                    });
                }
                let mut bytes = [0u8; $len];
                hex::decode_to_slice(s, &mut bytes)
                    .map_err(|e| NostrError::InvalidHex(e.to_string()))?;
                Ok(Self(bytes))
            }

            /// Build from a slice of exactly the right length.
            pub fn from_slice(slice: &[u8]) -> Result<Self, NostrError> {
                let bytes: [u8; $len] =
                    slice.try_into().map_err(|_| NostrError::InvalidLength {
                        expected: $len,
                        got: slice.len(),
                    })?;
                Ok(Self(bytes))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.to_hex())
            }
        }

        impl FromStr for $name {
            type Err = NostrError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_hex(s)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_hex())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Self::from_hex(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

hex_bytes_newtype!(
    /// A 32-byte event id (sha256 of the serialized event).
    EventId,
    32
);

hex_bytes_newtype!(
    /// A 32-byte x-only secp256k1 public key.
    PublicKey,
    32
);

hex_bytes_newtype!(
    /// A 64-byte BIP-340 Schnorr signature.
    Signature,
    64
);

// =============================================================================
// CLUSTER B: CONTENT
// =============================================================================

/// Event kind number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Kind(pub u16);

impl Kind {
    /// Profile metadata (NIP-01).
    pub const METADATA: Kind = Kind(0);
    /// Short text note (NIP-01).
    pub const TEXT_NOTE: Kind = Kind(1);
    /// Reaction (NIP-25).
    pub const REACTION: Kind = Kind(7);
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single tag: an ordered list of strings, the first naming the tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tag(pub Vec<String>);

impl Tag {
    /// `["e", <id>, <relay>]`
    pub fn event(id: &EventId, relay: &str) -> Self {
        Tag(vec!["e".to_string(), id.to_hex(), relay.to_string()])
    }

    /// `["e", <id>, <relay>, <marker>]`
    pub fn event_with_marker(id: &EventId, relay: &str, marker: &str) -> Self {
        Tag(vec![
            "e".to_string(),
            id.to_hex(),
            relay.to_string(),
            marker.to_string(),
        ])
    }

    /// `["p", <pubkey>, <relay>]`
    pub fn pubkey(pubkey: &PublicKey, relay: &str) -> Self {
        Tag(vec!["p".to_string(), pubkey.to_hex(), relay.to_string()])
    }

    /// Tag name (first element).
    pub fn name(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    /// Tag value (second element).
    pub fn value(&self) -> Option<&str> {
        self.0.get(1).map(String::as_str)
    }

    /// Relay hint (third element).
    pub fn relay_hint(&self) -> Option<&str> {
        self.0.get(2).map(String::as_str)
    }

    /// Marker (fourth element). `None` when the element is absent, which is
    /// distinct from an empty marker string.
    pub fn marker(&self) -> Option<&str> {
        self.0.get(3).map(String::as_str)
    }

    /// Is this an `e` tag?
    pub fn is_event_ref(&self) -> bool {
        self.name() == Some("e")
    }

    /// Referenced event id of an `e` tag, if the value is a valid id.
    pub fn event_id(&self) -> Option<EventId> {
        if !self.is_event_ref() {
            return None;
        }
        self.value().and_then(|v| EventId::from_hex(v).ok())
    }
}

/// A signed Nostr event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub pubkey: PublicKey,
    pub created_at: u64,
    pub kind: Kind,
    pub tags: Vec<Tag>,
    pub content: String,
    pub sig: Signature,
}

impl Event {
    /// All `e` tags in tag order.
    pub fn event_tags(&self) -> impl Iterator<Item = &Tag> {
        self.tags.iter().filter(|t| t.is_event_ref())
    }

    /// Is this a kind-1 text note?
    pub fn is_text_note(&self) -> bool {
        self.kind == Kind::TEXT_NOTE
    }
}
