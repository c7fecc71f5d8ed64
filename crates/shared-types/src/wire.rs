//! # Relay Wire Protocol (NIP-01)
//!
//! ```text
//! client → relay: ["EVENT", <event>] | ["REQ", <sub_id>, <filter>...] | ["CLOSE", <sub_id>]
//! relay → client: ["EVENT", <sub_id>, <event>] | ["OK", <id>, <bool>, <msg>]
//!                 ["EOSE", <sub_id>] | ["CLOSED", <sub_id>, <msg>] | ["NOTICE", <msg>]
//! ```

use serde_json::Value;

use crate::entities::{Event, EventId};
use crate::errors::NostrError;
use crate::filter::Filter;

/// Messages sent from client to relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    Event(Box<Event>),
    Req {
        subscription_id: String,
        filters: Vec<Filter>,
    },
    Close(String),
}

impl ClientMessage {
    pub fn to_json(&self) -> Result<String, NostrError> {
        let array = match self {
            Self::Event(event) => vec![Value::from("EVENT"), serde_json::to_value(event)?],
            Self::Req {
                subscription_id,
                filters,
            } => {
                let mut array = vec![Value::from("REQ"), Value::from(subscription_id.as_str())];
                for filter in filters {
                    array.push(serde_json::to_value(filter)?);
                }
                array
            }
            Self::Close(subscription_id) => {
                vec![Value::from("CLOSE"), Value::from(subscription_id.as_str())]
            }
        };
        Ok(Value::Array(array).to_string())
    }
}

/// Messages received from a relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayMessage {
    Event {
        subscription_id: String,
        event: Box<Event>,
    },
    Ok {
        event_id: EventId,
        accepted: bool,
        message: String,
    },
    EndOfStoredEvents(String),
    Closed {
        subscription_id: String,
        message: String,
    },
    Notice(String),
}

impl RelayMessage {
    pub fn from_json(text: &str) -> Result<Self, NostrError> {
        let value: Value = serde_json::from_str(text)?;
        let Value::Array(items) = value else {
            return Err(NostrError::MalformedMessage("not an array".to_string()));
        };
        let label = items.first().and_then(Value::as_str).unwrap_or_default();

        match label {
            "EVENT" => {
                let subscription_id = string_at(&items, 1)?;
                let raw = items
                    .get(2)
                    .cloned()
                    .ok_or_else(|| malformed("EVENT without event"))?;
                let event: Event = serde_json::from_value(raw)?;
                Ok(Self::Event {
                    subscription_id,
                    event: Box::new(event),
                })
            }
            "OK" => {
                let event_id = EventId::from_hex(&string_at(&items, 1)?)?;
                let accepted = items
                    .get(2)
                    .and_then(Value::as_bool)
                    .ok_or_else(|| malformed("OK without status"))?;
                let message = string_at(&items, 3).unwrap_or_default();
                Ok(Self::Ok {
                    event_id,
                    accepted,
                    message,
                })
            }
            "EOSE" => Ok(Self::EndOfStoredEvents(string_at(&items, 1)?)),
            "CLOSED" => Ok(Self::Closed {
                subscription_id: string_at(&items, 1)?,
                message: string_at(&items, 2).unwrap_or_default(),
            }),
            "NOTICE" => Ok(Self::Notice(string_at(&items, 1).unwrap_or_default())),
            other => Err(malformed(&format!("unsupported label {other:?}"))),
        }
    }
}

fn string_at(items: &[Value], index: usize) -> Result<String, NostrError> {
    items
        .get(index)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| malformed(&format!("missing string at {index}")))
}

fn malformed(reason: &str) -> NostrError {
    NostrError::MalformedMessage(reason.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Kind;

    #[test]
    fn test_req_serialization() {
        let msg = ClientMessage::Req {
            subscription_id: "sub1".to_string(),
            filters: vec![Filter::new().kinds([Kind::TEXT_NOTE])],
        };
        assert_eq!(msg.to_json().unwrap(), r#"["REQ","sub1",{"kinds":[1]}]"#);
    }

    #[test]
    fn test_close_serialization() {
        let msg = ClientMessage::Close("sub1".to_string());
        assert_eq!(msg.to_json().unwrap(), r#"["CLOSE","sub1"]"#);
    }

    #[test]
    fn test_parse_ok() {
        let text = format!(r#"["OK","{}",false,"blocked: spam"]"#, "ab".repeat(32));
        let msg = RelayMessage::from_json(&text).unwrap();
        assert_eq!(
            msg,
            RelayMessage::Ok {
                event_id: EventId::from_bytes([0xAB; 32]),
                accepted: false,
                message: "blocked: spam".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_eose_and_notice() {
        assert_eq!(
            RelayMessage::from_json(r#"["EOSE","s"]"#).unwrap(),
            RelayMessage::EndOfStoredEvents("s".to_string())
        );
        assert_eq!(
            RelayMessage::from_json(r#"["NOTICE","slow down"]"#).unwrap(),
            RelayMessage::Notice("slow down".to_string())
        );
    }

    #[test]
    fn test_parse_rejects_unknown_label() {
        let result = RelayMessage::from_json(r#"["AUTH","challenge"]"#);
        assert!(matches!(result, Err(NostrError::MalformedMessage(_))));
    }

    #[test]
    fn test_parse_rejects_non_array() {
        let result = RelayMessage::from_json(r#"{"kind":1}"#);
        assert!(matches!(result, Err(NostrError::MalformedMessage(_))));
    }
}
