//! padlink-host library crate.
//!
//! The host side of PadLink: a small server on the desktop that a phone
//! pairs with over the LAN and then drives as a touch pad and keyboard.
//!
//! # Architecture
//!
//! ```text
//! Phone (JSON envelopes over WebSocket)
//!         ↕
//! [padlink-host]
//!   ├── domain/           HostConfig, Connection lifecycle
//!   ├── application/      CommandDispatcher, the eight cmd_* handlers, ports
//!   └── infrastructure/
//!         ├── bootstrap/    credentials → TLS → port → bind
//!         ├── http_server/  /config, static pages, WebSocket sessions
//!         └── input_injection/  enigo-backed mouse and keyboard
//! ```
//!
//! # Layer rules
//!
//! - `domain` does no network I/O and has no async code.
//! - `application` depends on `domain` and `padlink-core`; OS access goes
//!   through the [`application::ports`] traits.
//! - `infrastructure` implements those ports and owns every socket.

/// Domain layer: configuration and connection state.
pub mod domain;

/// Application layer: command routing and handlers.
pub mod application;

/// Infrastructure layer: transport, TLS, OS input and browser.
pub mod infrastructure;
