//! Port negotiation.
//!
//! Starting from the preferred port, each candidate is tried by binding a
//! listener and dropping it straight away.  A port reported "in use" moves
//! the search to the next one.  Any other bind failure stops the search,
//! since the next port would most likely fail the same way.
//!
//! The trial bind does not reserve the port.  Another process may take it
//! before the server binds for real, which the bootstrapper reports as
//! [`BootstrapError::PortRaced`](super::bootstrap::BootstrapError::PortRaced).

use std::io::ErrorKind;
use std::net::{IpAddr, SocketAddr};

use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{debug, info};

/// Error type for port negotiation.
#[derive(Debug, Error)]
pub enum PortError {
    /// Port 0 asks the OS for an ephemeral port, which is never advertised.
    #[error("preferred port must be between 1 and 65535")]
    InvalidStart,

    #[error("no free port in {start}..={last} after {attempts} attempts")]
    Exhausted { start: u16, last: u16, attempts: u32 },

    /// A bind failure other than "address in use".
    #[error("cannot bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

/// Returns the first port at or above `start` that `ip` can bind.
///
/// At most `max_attempts` ports are tried (at least one), never past 65535.
///
/// # Errors
///
/// See [`PortError`].
pub async fn find_available_port(ip: IpAddr, start: u16, max_attempts: u16) -> Result<u16, PortError> {
    if start == 0 {
        return Err(PortError::InvalidStart);
    }

    let max_attempts = u32::from(max_attempts.max(1));
    let mut port = start;
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        let addr = SocketAddr::new(ip, port);
        match TcpListener::bind(addr).await {
            Ok(listener) => {
                drop(listener);
                debug!("port {port} is free");
                return Ok(port);
            }
            Err(e) if e.kind() == ErrorKind::AddrInUse => {
                info!("port {port} is in use, trying {}", port.saturating_add(1));
            }
            Err(source) => return Err(PortError::Bind { addr, source }),
        }

        if attempts >= max_attempts || port == u16::MAX {
            return Err(PortError::Exhausted {
                start,
                last: port,
                attempts,
            });
        }
        port += 1;
    }
}
