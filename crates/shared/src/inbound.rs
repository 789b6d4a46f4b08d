//! Decoding of raw inbound socket frames.
//!
//! A frame is UTF-8 JSON holding either one event object or an array of
//! them. Each element is decoded on its own so one bad element never takes
//! its siblings down with it.

use serde_json::Value;
use thiserror::Error;

use crate::messages::{EventPayload, ServerEvent, ServerNotice};

/// Why an inbound frame (or one element of it) was rejected.
#[derive(Debug, Error)]
pub enum InboundError {
    #[error("frame is not valid JSON: {0}")]
    Json(#[source] serde_json::Error),

    #[error("event is not a JSON object")]
    NotAnObject,

    #[error("event has no \"type\" tag")]
    MissingType,

    #[error("unknown event type {0:?}")]
    UnknownType(String),

    #[error("malformed {kind} event: {source}")]
    Malformed {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Result of decoding one frame: the events that decoded, in array order,
/// and the per-element failures.
#[derive(Debug, Default)]
pub struct DecodedFrame {
    pub events: Vec<ServerEvent>,
    pub rejected: Vec<InboundError>,
}

impl DecodedFrame {
    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.rejected.is_empty()
    }
}

/// Decode one text frame.
///
/// Returns `Err` only when the frame as a whole is not JSON; element-level
/// problems are reported in [`DecodedFrame::rejected`].
pub fn decode_frame(text: &str) -> Result<DecodedFrame, InboundError> {
    let value: Value = serde_json::from_str(text).map_err(InboundError::Json)?;

    let mut frame = DecodedFrame::default();
    match value {
        Value::Array(items) => {
            for item in items {
                match decode_event(item) {
                    Ok(event) => frame.events.push(event),
                    Err(e) => frame.rejected.push(e),
                }
            }
        }
        single => match decode_event(single) {
            Ok(event) => frame.events.push(event),
            Err(e) => frame.rejected.push(e),
        },
    }
    Ok(frame)
}

/// Decode one event object.
pub fn decode_event(value: Value) -> Result<ServerEvent, InboundError> {
    let Value::Object(map) = &value else {
        return Err(InboundError::NotAnObject);
    };

    // The server reports command failures as a bare {"error": "..."}.
    if !map.contains_key("type") {
        if let Some(message) = map.get("error") {
            let message = match message {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            return Ok(ServerEvent::anonymous(EventPayload::CommandRejected(
                ServerNotice { message },
            )));
        }
        return Err(InboundError::MissingType);
    }

    let kind = match map.get("type") {
        Some(Value::String(tag)) => tag.clone(),
        _ => return Err(InboundError::MissingType),
    };
    if !EventPayload::is_known_type(&kind) {
        return Err(InboundError::UnknownType(kind));
    }

    serde_json::from_value(value).map_err(|source| InboundError::Malformed { kind, source })
}
