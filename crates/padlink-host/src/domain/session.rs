//! Connection identity and lifecycle.
//!
//! ```text
//! Open ──(transport close or error)──▶ Closed
//! ```
//!
//! `Closed` is terminal: a connection is never reopened.  A reconnecting
//! phone gets a fresh [`Connection`] with a new [`SessionId`].

use std::fmt;
use std::net::SocketAddr;

use uuid::Uuid;

/// Opaque per-connection identifier used in log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The first group is enough to tell sessions apart in logs.
        let full = self.0.simple().to_string();
        f.write_str(&full[..8])
    }
}

/// Lifecycle state of one accepted transport session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Open,
    Closed,
}

/// One accepted transport session.
#[derive(Debug)]
pub struct Connection {
    id: SessionId,
    peer: Option<SocketAddr>,
    state: ConnectionState,
}

impl Connection {
    /// Creates a connection in the `Open` state.
    pub fn open(peer: Option<SocketAddr>) -> Self {
        Self {
            id: SessionId::new(),
            peer,
            state: ConnectionState::Open,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn peer(&self) -> Option<SocketAddr> {
        self.peer
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == ConnectionState::Open
    }

    /// Moves the connection to `Closed`.
    ///
    /// Returns `true` on the transition and `false` if it was already closed.
    pub fn close(&mut self) -> bool {
        let was_open = self.is_open();
        self.state = ConnectionState::Closed;
        was_open
    }
}
