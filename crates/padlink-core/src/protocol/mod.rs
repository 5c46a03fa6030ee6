//! Protocol module containing the frame envelope and the command payloads.

pub mod commands;
pub mod envelope;

pub use commands::*;
pub use envelope::{Envelope, ProtocolError};
