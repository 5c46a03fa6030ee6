//! # padlink-core
//!
//! Shared wire types for PadLink, a host server that lets a phone drive the
//! mouse, keyboard, scroll wheel, and browser of the machine it runs on.
//!
//! This crate has no I/O: it only describes what travels over the WebSocket
//! and how each command's payload is validated.
//!
//! - **`protocol`** – The `{event, data}` envelope every frame carries, the
//!   eight command names, and one typed payload per command.  A payload that
//!   does not match its command's shape is rejected while decoding, before
//!   any OS action is attempted.
//!
//! - **`keymap`** – The closed set of key names accepted by `cmd_key_tap`.

pub mod keymap;
pub mod protocol;

pub use keymap::{KeyName, KeyNameError};
pub use protocol::envelope::{Envelope, ProtocolError};
pub use protocol::commands::{
    GotoTarget, MouseButton, MouseDelta, PayloadError, ScrollDelta, TypedText,
};
