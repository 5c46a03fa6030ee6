//! Host configuration types.
//!
//! [`HostConfig`] is the single source of truth for runtime settings.  It is
//! resolved once at startup from three layers, highest precedence first:
//!
//! 1. CLI flags / `PADLINK_*` environment variables (see `main.rs`)
//! 2. An optional TOML file passed with `--config`
//! 3. Built-in defaults
//!
//! # Config file
//!
//! ```toml
//! [server]
//! port = 3000
//! bind = "0.0.0.0"
//! public_dir = "public"
//! open_browser = true
//!
//! [tls]
//! secure = true
//! key = "key.pem"
//! cert = "cert.pem"
//!
//! [input]
//! submit_typed_text = false
//! ```
//!
//! Every field has a serde default, so a partial file (or no file at all)
//! still yields a complete configuration.

use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error other than "not found".
    #[error("I/O error reading config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

// ── Resolved configuration ────────────────────────────────────────────────────

/// Whether the listening socket speaks plain HTTP/WS or HTTPS/WSS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    Plain,
    Secure,
}

impl TransportMode {
    pub fn from_secure_flag(secure: bool) -> Self {
        if secure {
            Self::Secure
        } else {
            Self::Plain
        }
    }

    /// URL scheme for pages served in this mode.
    pub fn scheme(self) -> &'static str {
        match self {
            Self::Plain => "http",
            Self::Secure => "https",
        }
    }

    pub fn is_secure(self) -> bool {
        self == Self::Secure
    }
}

/// Locations of the TLS private key and certificate, relative to the working
/// directory unless absolute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialPaths {
    pub key: PathBuf,
    pub cert: PathBuf,
}

impl CredentialPaths {
    pub fn new(key: impl Into<PathBuf>, cert: impl Into<PathBuf>) -> Self {
        Self {
            key: key.into(),
            cert: cert.into(),
        }
    }

    /// Both paths joined onto `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(DEFAULT_KEY_FILE), dir.join(DEFAULT_CERT_FILE))
    }
}

impl Default for CredentialPaths {
    fn default() -> Self {
        Self::new(DEFAULT_KEY_FILE, DEFAULT_CERT_FILE)
    }
}

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_MAX_PORT_ATTEMPTS: u16 = 1000;
pub const DEFAULT_KEY_FILE: &str = "key.pem";
pub const DEFAULT_CERT_FILE: &str = "cert.pem";
pub const DEFAULT_PUBLIC_DIR: &str = "public";
pub const DEFAULT_CERT_TIMEOUT_SECS: u64 = 60;

/// All runtime configuration for the host server.
#[derive(Debug, Clone, PartialEq)]
pub struct HostConfig {
    /// Interface the listening socket binds to.
    pub bind_ip: IpAddr,
    /// First port tried by the port negotiator.
    pub preferred_port: u16,
    /// Upper bound on ports tried before giving up.
    pub max_port_attempts: u16,
    pub mode: TransportMode,
    /// Only read when `mode` is [`TransportMode::Secure`].
    pub credentials: CredentialPaths,
    /// Upper bound on the openssl certificate generation subprocess.
    pub cert_timeout: Duration,
    /// Root directory for the static pairing and touch-pad pages.
    pub public_dir: PathBuf,
    /// Address published in URLs; detected from the LAN route when `None`.
    pub advertise_host: Option<IpAddr>,
    /// Open the pairing page in the local browser after startup.
    pub open_browser: bool,
    /// Press Enter after every `cmd_type`.
    pub submit_typed_text: bool,
}

impl Default for HostConfig {
    fn default() -> Self {
        FileConfig::default().into()
    }
}

// ── Config file schema ────────────────────────────────────────────────────────

/// On-disk TOML schema.  Mirrors the CLI flags.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub tls: TlsSection,
    #[serde(default)]
    pub input: InputSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind")]
    pub bind: IpAddr,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advertise_host: Option<IpAddr>,
    #[serde(default = "default_public_dir")]
    pub public_dir: PathBuf,
    #[serde(default = "default_true")]
    pub open_browser: bool,
    #[serde(default = "default_max_port_attempts")]
    pub max_port_attempts: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TlsSection {
    #[serde(default)]
    pub secure: bool,
    #[serde(default = "default_key")]
    pub key: PathBuf,
    #[serde(default = "default_cert")]
    pub cert: PathBuf,
    #[serde(default = "default_cert_timeout_secs")]
    pub generate_timeout_secs: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputSection {
    #[serde(default)]
    pub submit_typed_text: bool,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_bind() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}
fn default_public_dir() -> PathBuf {
    PathBuf::from(DEFAULT_PUBLIC_DIR)
}
fn default_true() -> bool {
    true
}
fn default_max_port_attempts() -> u16 {
    DEFAULT_MAX_PORT_ATTEMPTS
}
fn default_key() -> PathBuf {
    PathBuf::from(DEFAULT_KEY_FILE)
}
fn default_cert() -> PathBuf {
    PathBuf::from(DEFAULT_CERT_FILE)
}
fn default_cert_timeout_secs() -> u64 {
    DEFAULT_CERT_TIMEOUT_SECS
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind: default_bind(),
            advertise_host: None,
            public_dir: default_public_dir(),
            open_browser: default_true(),
            max_port_attempts: default_max_port_attempts(),
        }
    }
}

impl Default for TlsSection {
    fn default() -> Self {
        Self {
            secure: false,
            key: default_key(),
            cert: default_cert(),
            generate_timeout_secs: default_cert_timeout_secs(),
        }
    }
}

impl From<FileConfig> for HostConfig {
    fn from(file: FileConfig) -> Self {
        Self {
            bind_ip: file.server.bind,
            preferred_port: file.server.port,
            max_port_attempts: file.server.max_port_attempts,
            mode: TransportMode::from_secure_flag(file.tls.secure),
            credentials: CredentialPaths::new(file.tls.key, file.tls.cert),
            cert_timeout: Duration::from_secs(file.tls.generate_timeout_secs),
            public_dir: file.server.public_dir,
            advertise_host: file.server.advertise_host,
            open_browser: file.server.open_browser,
            submit_typed_text: file.input.submit_typed_text,
        }
    }
}

/// Loads a [`FileConfig`] from `path`, returning defaults if the file does
/// not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_file_config(path: &Path) -> Result<FileConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(FileConfig::default()),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
