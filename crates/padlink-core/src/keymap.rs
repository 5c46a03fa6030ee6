//! Key names accepted by `cmd_key_tap`.
//!
//! The client sends the lowercase names its soft keyboard knows about
//! (`"enter"`, `"backspace"`, `"up"`, `"f5"`, …) or a single printable
//! character.  Names are matched case-insensitively; a single character is
//! kept as typed so `"A"` and `"a"` stay distinct.
//!
//! Anything outside this set is rejected while the frame is decoded.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned for a key name that is not in the supported set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyNameError {
    #[error("unknown key name: {0:?}")]
    Unknown(String),
}

/// A single key the host can tap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum KeyName {
    Enter,
    Tab,
    Space,
    Backspace,
    Delete,
    Escape,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    Shift,
    Control,
    Alt,
    /// Command on macOS, the Windows/Super key elsewhere.
    Command,
    /// Function keys F1 through F12.
    Function(u8),
    /// A single printable character.
    Char(char),
}

impl KeyName {
    /// Canonical lowercase name, the inverse of [`FromStr`].
    pub fn name(&self) -> String {
        let fixed = match self {
            Self::Enter => "enter",
            Self::Tab => "tab",
            Self::Space => "space",
            Self::Backspace => "backspace",
            Self::Delete => "delete",
            Self::Escape => "escape",
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
            Self::Home => "home",
            Self::End => "end",
            Self::PageUp => "pageup",
            Self::PageDown => "pagedown",
            Self::Shift => "shift",
            Self::Control => "control",
            Self::Alt => "alt",
            Self::Command => "command",
            Self::Function(n) => return format!("f{n}"),
            Self::Char(c) => return c.to_string(),
        };
        fixed.to_string()
    }
}

impl FromStr for KeyName {
    type Err = KeyNameError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let mut chars = raw.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if c == ' ' {
                return Ok(Self::Space);
            }
            if !c.is_control() {
                return Ok(Self::Char(c));
            }
        }

        let lower = raw.to_ascii_lowercase();
        let key = match lower.as_str() {
            "enter" | "return" => Self::Enter,
            "tab" => Self::Tab,
            "space" => Self::Space,
            "backspace" => Self::Backspace,
            "delete" | "del" => Self::Delete,
            "escape" | "esc" => Self::Escape,
            "up" => Self::Up,
            "down" => Self::Down,
            "left" => Self::Left,
            "right" => Self::Right,
            "home" => Self::Home,
            "end" => Self::End,
            "pageup" => Self::PageUp,
            "pagedown" => Self::PageDown,
            "shift" => Self::Shift,
            "control" | "ctrl" => Self::Control,
            "alt" => Self::Alt,
            "command" | "cmd" | "meta" | "super" => Self::Command,
            other => match other.strip_prefix('f').map(str::parse::<u8>) {
                Some(Ok(n)) if (1..=12).contains(&n) => Self::Function(n),
                _ => return Err(KeyNameError::Unknown(raw.to_string())),
            },
        };
        Ok(key)
    }
}

impl TryFrom<String> for KeyName {
    type Error = KeyNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<KeyName> for String {
    fn from(key: KeyName) -> Self {
        key.name()
    }
}

impl fmt::Display for KeyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_keys_parse_case_insensitively() {
        assert_eq!("Enter".parse::<KeyName>().unwrap(), KeyName::Enter);
        assert_eq!("BACKSPACE".parse::<KeyName>().unwrap(), KeyName::Backspace);
        assert_eq!("pagedown".parse::<KeyName>().unwrap(), KeyName::PageDown);
    }

    #[test]
    fn test_aliases() {
        assert_eq!("return".parse::<KeyName>().unwrap(), KeyName::Enter);
        assert_eq!("esc".parse::<KeyName>().unwrap(), KeyName::Escape);
        assert_eq!("ctrl".parse::<KeyName>().unwrap(), KeyName::Control);
        assert_eq!("cmd".parse::<KeyName>().unwrap(), KeyName::Command);
    }

    #[test]
    fn test_function_keys_in_range() {
        assert_eq!("f1".parse::<KeyName>().unwrap(), KeyName::Function(1));
        assert_eq!("F12".parse::<KeyName>().unwrap(), KeyName::Function(12));
        assert!("f0".parse::<KeyName>().is_err());
        assert!("f13".parse::<KeyName>().is_err());
    }

    #[test]
    fn test_single_character_keeps_case() {
        assert_eq!("A".parse::<KeyName>().unwrap(), KeyName::Char('A'));
        assert_eq!("a".parse::<KeyName>().unwrap(), KeyName::Char('a'));
        assert_eq!("é".parse::<KeyName>().unwrap(), KeyName::Char('é'));
    }

    #[test]
    fn test_single_space_is_space_key() {
        assert_eq!(" ".parse::<KeyName>().unwrap(), KeyName::Space);
    }

    #[test]
    fn test_unknown_name_is_rejected() {
        assert_eq!(
            "hyper".parse::<KeyName>(),
            Err(KeyNameError::Unknown("hyper".to_string()))
        );
        assert!("".parse::<KeyName>().is_err());
        assert!("\n".parse::<KeyName>().is_err());
    }

    #[test]
    fn test_name_round_trips_through_parse() {
        for key in [
            KeyName::Enter,
            KeyName::PageUp,
            KeyName::Command,
            KeyName::Function(7),
            KeyName::Char('x'),
        ] {
            assert_eq!(key.name().parse::<KeyName>().unwrap(), key);
        }
    }

    #[test]
    fn test_deserializes_from_json_string() {
        let key: KeyName = serde_json::from_str("\"tab\"").unwrap();
        assert_eq!(key, KeyName::Tab);
        assert!(serde_json::from_str::<KeyName>("42").is_err());
    }
}
