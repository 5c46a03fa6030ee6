//! Domain layer for padlink-host.
//!
//! Plain types with no sockets, no async, and no file I/O beyond what the
//! TOML config reader needs:
//!
//! - Host configuration (CLI + file + defaults, resolved once at startup)
//! - Connection identity and lifecycle state

pub mod config;
pub mod session;

pub use config::{ConfigError, CredentialPaths, FileConfig, HostConfig, TransportMode};
pub use session::{Connection, ConnectionState, SessionId};
