//! Command names and their typed payloads.
//!
//! | `event`           | `data`                 | Payload type          |
//! |-------------------|------------------------|-----------------------|
//! | `cmd_goto`        | `"example.com"`        | [`GotoTarget`]        |
//! | `cmd_mouse_move`  | `{"x":3,"y":-2}`       | [`MouseDelta`]        |
//! | `cmd_mouse_click` | `"left"`               | [`MouseButton`]       |
//! | `cmd_mouse_down`  | `"left"`               | [`MouseButton`]       |
//! | `cmd_mouse_up`    | `"left"`               | [`MouseButton`]       |
//! | `cmd_type`        | `"hello"`              | [`TypedText`]         |
//! | `cmd_scroll`      | `{"amount":5}`         | [`ScrollDelta`]       |
//! | `cmd_key_tap`     | `"enter"`              | [`KeyName`](crate::KeyName) |
//!
//! Every payload derives `Deserialize` so a mismatched `data` value fails
//! while the frame is decoded, not later inside the OS call.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CMD_GOTO: &str = "cmd_goto";
pub const CMD_MOUSE_MOVE: &str = "cmd_mouse_move";
pub const CMD_MOUSE_CLICK: &str = "cmd_mouse_click";
pub const CMD_MOUSE_DOWN: &str = "cmd_mouse_down";
pub const CMD_MOUSE_UP: &str = "cmd_mouse_up";
pub const CMD_TYPE: &str = "cmd_type";
pub const CMD_SCROLL: &str = "cmd_scroll";
pub const CMD_KEY_TAP: &str = "cmd_key_tap";

/// Every command name the host understands.
pub const COMMAND_NAMES: [&str; 8] = [
    CMD_GOTO,
    CMD_MOUSE_MOVE,
    CMD_MOUSE_CLICK,
    CMD_MOUSE_DOWN,
    CMD_MOUSE_UP,
    CMD_TYPE,
    CMD_SCROLL,
    CMD_KEY_TAP,
];

/// Payload validation failures that serde's structural checks cannot express.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    #[error("navigation target is empty")]
    EmptyTarget,
    #[error("navigation scheme `{0}` is not allowed (only http and https)")]
    UnsupportedScheme(String),
    #[error("navigation target contains control characters")]
    ControlCharacter,
}

// ── Pointer payloads ──────────────────────────────────────────────────────────

/// Relative cursor movement reported by the touch pad.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MouseDelta {
    pub x: f64,
    pub y: f64,
}

impl MouseDelta {
    /// Returns the absolute target for a cursor currently at `origin` when
    /// the delta is multiplied by `speed`.
    ///
    /// Fractional results are rounded to the nearest pixel.
    pub fn target_from(&self, origin: (i32, i32), speed: f64) -> (i32, i32) {
        let x = f64::from(origin.0) + self.x * speed;
        let y = f64::from(origin.1) + self.y * speed;
        (x.round() as i32, y.round() as i32)
    }
}

/// Vertical scroll request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScrollDelta {
    pub amount: f64,
}

impl ScrollDelta {
    /// Scroll distance in wheel steps after applying `speed`.
    pub fn vertical_steps(&self, speed: f64) -> i32 {
        (self.amount * speed).round() as i32
    }
}

/// Mouse button identifier as sent by the client.
///
/// A `null` or absent payload means the left button.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Middle,
}

// ── Text payloads ─────────────────────────────────────────────────────────────

/// Literal text to inject.
///
/// `Debug` prints only the length; typed text may be a password.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypedText(pub String);

impl TypedText {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for TypedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypedText({} chars)", self.0.chars().count())
    }
}

/// A URL to open in the host's default browser, normalised on decode.
///
/// - Surrounding whitespace is trimmed.
/// - `http://` and `https://` (any case) are kept as given.
/// - Any other `scheme://` is rejected.
/// - Anything else is treated as a bare host or path and gets `https://`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GotoTarget(String);

impl GotoTarget {
    /// Normalises `raw` into an openable URL.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError`] for empty input, control characters, or a
    /// scheme other than http/https.
    pub fn parse(raw: &str) -> Result<Self, PayloadError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(PayloadError::EmptyTarget);
        }
        if trimmed.chars().any(char::is_control) {
            return Err(PayloadError::ControlCharacter);
        }

        match trimmed.split_once("://") {
            Some((scheme, _)) if is_scheme(scheme) => {
                let lower = scheme.to_ascii_lowercase();
                if lower == "http" || lower == "https" {
                    Ok(Self(trimmed.to_string()))
                } else {
                    Err(PayloadError::UnsupportedScheme(scheme.to_string()))
                }
            }
            _ => Ok(Self(format!("https://{trimmed}"))),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// RFC 3986 scheme: a letter followed by letters, digits, `+`, `-` or `.`.
fn is_scheme(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

impl TryFrom<String> for GotoTarget {
    type Error = PayloadError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<GotoTarget> for String {
    fn from(target: GotoTarget) -> Self {
        target.0
    }
}

impl fmt::Display for GotoTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
