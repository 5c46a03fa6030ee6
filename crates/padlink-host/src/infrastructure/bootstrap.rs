//! Transport bootstrapping: from a resolved [`HostConfig`] to a bound
//! listening socket.
//!
//! The steps run in a fixed order and any failure aborts startup:
//!
//! 1. Secure mode only: provision TLS credentials, then build the acceptor.
//! 2. Negotiate a free port starting at the preferred one.
//! 3. Bind the real listener on that port.
//!
//! Advertised URLs are derived only after step 3, so they always carry the
//! port that was actually bound.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;
use tracing::info;

use crate::domain::config::{HostConfig, TransportMode};
use crate::infrastructure::credentials::{
    CertificateGenerator, CredentialError, CredentialProvisioner, OpensslGenerator, Provisioned,
};
use crate::infrastructure::port::{find_available_port, PortError};
use crate::infrastructure::tls::{load_tls_acceptor, TlsError};

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("TLS credentials unavailable: {0}")]
    Credentials(#[from] CredentialError),

    #[error("TLS setup failed: {0}")]
    Tls(#[from] TlsError),

    #[error("port negotiation failed: {0}")]
    Port(#[from] PortError),

    /// The negotiated port was taken between the search and the real bind.
    #[error("port {port} was taken by another process during startup")]
    PortRaced { port: u16 },

    #[error("cannot bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

/// Where clients reach the server once it is bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapInfo {
    pub mode: TransportMode,
    /// Host placed in advertised URLs.
    pub host: IpAddr,
    /// The port actually bound.
    pub port: u16,
    /// `scheme://host:port` with no trailing slash.
    pub base_url: String,
}

impl BootstrapInfo {
    pub fn new(mode: TransportMode, host: IpAddr, port: u16) -> Self {
        let base_url = format!("{}://{}", mode.scheme(), SocketAddr::new(host, port));
        Self {
            mode,
            host,
            port,
            base_url,
        }
    }

    /// Absolute URL of a page under the public root.
    pub fn page_url(&self, page: &str) -> String {
        format!("{}/{}", self.base_url, page.trim_start_matches('/'))
    }

    /// URL of the touch-pad page, as reported by `/config`.
    pub fn host_url(&self) -> String {
        self.page_url("index.html")
    }
}

/// A bound listener plus what is needed to serve it.
pub struct BoundTransport {
    pub listener: TcpListener,
    /// Present in secure mode.
    pub tls: Option<TlsAcceptor>,
    pub info: BootstrapInfo,
}

pub struct TransportBootstrapper<G> {
    provisioner: CredentialProvisioner<G>,
}

impl TransportBootstrapper<OpensslGenerator> {
    /// Bootstrapper that generates missing credentials with `openssl`.
    pub fn with_openssl(cert_timeout: Duration) -> Self {
        Self::new(OpensslGenerator::new(cert_timeout))
    }
}

impl<G: CertificateGenerator> TransportBootstrapper<G> {
    pub fn new(generator: G) -> Self {
        Self {
            provisioner: CredentialProvisioner::new(generator),
        }
    }

    /// Runs the bootstrap sequence and returns the bound transport.
    ///
    /// `advertised` is the host placed in [`BootstrapInfo::base_url`].
    pub async fn start(
        &self,
        config: &HostConfig,
        advertised: IpAddr,
    ) -> Result<BoundTransport, BootstrapError> {
        let tls = match config.mode {
            TransportMode::Secure => {
                if self.provisioner.ensure(&config.credentials).await? == Provisioned::Generated {
                    info!("new self-signed certificate in use; phones will show a warning");
                }
                Some(load_tls_acceptor(&config.credentials).await?)
            }
            TransportMode::Plain => None,
        };

        let port =
            find_available_port(config.bind_ip, config.preferred_port, config.max_port_attempts)
                .await?;
        if port != config.preferred_port {
            info!("port {} unavailable, using {port}", config.preferred_port);
        }

        let addr = SocketAddr::new(config.bind_ip, port);
        let listener = TcpListener::bind(addr).await.map_err(|source| {
            if source.kind() == std::io::ErrorKind::AddrInUse {
                BootstrapError::PortRaced { port }
            } else {
                BootstrapError::Bind { addr, source }
            }
        })?;

        let info = BootstrapInfo::new(config.mode, advertised, port);
        info!("listening on {addr} ({})", config.mode.scheme());

        Ok(BoundTransport { listener, tls, info })
    }
}
