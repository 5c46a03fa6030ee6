//! The JSON envelope carried by every inbound WebSocket frame.
//!
//! ```json
//! {"event":"cmd_scroll","data":{"amount":5}}
//! ```
//!
//! `event` names the handler; `data` is left as raw JSON because its shape
//! depends on the command.  Decoding `data` into a typed payload is the
//! handler registration's job (see `padlink-host`'s dispatcher), so an
//! envelope for an unknown command can still be parsed and reported.
//!
//! Keys other than `event` and `data` are ignored.  A missing `data` key is
//! read as `null`, which is what commands without a payload expect.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Errors produced while parsing a raw frame into an [`Envelope`].
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The frame was not valid JSON, or its object lacked a string `event`.
    #[error("malformed envelope: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The frame was valid JSON but not an object (an array, a string, ...).
    #[error("envelope must be a JSON object, got {0}")]
    NotAnObject(&'static str),
}

/// One inbound unit of work: a command name plus its untyped payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Command identifier, e.g. `"cmd_mouse_move"`.
    pub event: String,
    /// Command-specific payload.
    #[serde(default)]
    pub data: Value,
}

impl Envelope {
    /// Builds an envelope from a command name and payload.
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }

    /// Parses a raw frame (text or binary) into an envelope.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::NotAnObject`] for valid JSON that is not an
    /// object, and [`ProtocolError::Malformed`] for invalid JSON or an object
    /// without a string `event` field.
    pub fn parse(raw: &[u8]) -> Result<Self, ProtocolError> {
        // The derived impl would also accept `[event, data]` in field order.
        match serde_json::from_slice::<Value>(raw)? {
            object @ Value::Object(_) => Ok(serde_json::from_value(object)?),
            other => Err(ProtocolError::NotAnObject(json_kind(&other))),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
