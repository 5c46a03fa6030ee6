//! Integration tests: raw client frames through the envelope parser into the
//! typed payload of each command.
//!
//! These mirror what the host dispatcher does with every frame: parse the
//! envelope, then decode `data` into the payload type registered for `event`.

use padlink_core::protocol::commands::{
    CMD_GOTO, CMD_KEY_TAP, CMD_MOUSE_CLICK, CMD_MOUSE_MOVE, CMD_SCROLL, CMD_TYPE,
};
use padlink_core::{Envelope, GotoTarget, KeyName, MouseButton, MouseDelta, ScrollDelta, TypedText};
use serde::de::DeserializeOwned;

/// Parses `raw`, checks the event name, and decodes the payload as `P`.
fn decode<P: DeserializeOwned>(raw: &str, expected_event: &str) -> Result<P, serde_json::Error> {
    let envelope = Envelope::parse(raw.as_bytes()).expect("envelope must parse");
    assert_eq!(envelope.event, expected_event);
    serde_json::from_value(envelope.data)
}

#[test]
fn test_mouse_move_frame() {
    let delta: MouseDelta =
        decode(r#"{"event":"cmd_mouse_move","data":{"x":3,"y":-2}}"#, CMD_MOUSE_MOVE).unwrap();
    assert_eq!(delta.target_from((100, 100), 2.0), (106, 96));
}

#[test]
fn test_scroll_frame() {
    let delta: ScrollDelta =
        decode(r#"{"event":"cmd_scroll","data":{"amount":5}}"#, CMD_SCROLL).unwrap();
    assert_eq!(delta.vertical_steps(1.0), 5);
}

#[test]
fn test_click_frame_without_data_uses_left_button() {
    let button: Option<MouseButton> = decode(r#"{"event":"cmd_mouse_click"}"#, CMD_MOUSE_CLICK).unwrap();
    assert_eq!(button.unwrap_or_default(), MouseButton::Left);
}

#[test]
fn test_type_frame() {
    let text: TypedText = decode(r#"{"event":"cmd_type","data":"hello"}"#, CMD_TYPE).unwrap();
    assert_eq!(text.as_str(), "hello");
}

#[test]
fn test_key_tap_frame() {
    let key: KeyName = decode(r#"{"event":"cmd_key_tap","data":"backspace"}"#, CMD_KEY_TAP).unwrap();
    assert_eq!(key, KeyName::Backspace);
}

#[test]
fn test_goto_frame_normalises_target() {
    let target: GotoTarget = decode(r#"{"event":"cmd_goto","data":"example.com"}"#, CMD_GOTO).unwrap();
    assert_eq!(target.as_str(), "https://example.com");
}

#[test]
fn test_known_event_with_wrong_shape_is_rejected_at_decode() {
    // A scroll frame whose data is a bare number instead of {amount}.
    let result: Result<ScrollDelta, _> = decode(r#"{"event":"cmd_scroll","data":5}"#, CMD_SCROLL);
    assert!(result.is_err());

    // A key tap whose key name is not in the supported set.
    let result: Result<KeyName, _> = decode(r#"{"event":"cmd_key_tap","data":"hyper"}"#, CMD_KEY_TAP);
    assert!(result.is_err());
}
