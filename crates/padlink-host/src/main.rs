//! PadLink host: entry point.
//!
//! Starts the server a phone pairs with to act as a remote mouse and
//! keyboard for this machine.
//!
//! # Usage
//!
//! ```text
//! padlink-host [OPTIONS]
//!
//! Options:
//!   -s, --secure                   Serve HTTPS/WSS (self-signed cert if none)
//!       --port <PORT>              Preferred port [default: 3000]
//!       --bind <IP>                Interface to listen on [default: 0.0.0.0]
//!       --advertise-host <IP>      Host used in printed URLs [default: LAN IP]
//!       --key <PATH>               TLS private key [default: key.pem]
//!       --cert <PATH>              TLS certificate [default: cert.pem]
//!       --public-dir <DIR>         Static pages [default: public]
//!       --no-open                  Do not open the pairing page locally
//!       --submit-typed-text        Press Enter after typed text
//!       --max-port-attempts <N>    Ports tried before giving up [default: 1000]
//!       --config <PATH>            Optional TOML config file
//! ```
//!
//! Every flag can also be set with a `PADLINK_*` environment variable
//! (`PADLINK_PORT`, `PADLINK_SECURE`, ...).  Flags override the config file,
//! which overrides the built-in defaults.
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use padlink_host::application::{BrowserLauncher, CommandDispatcher, InputInjector, RemoteControl};
use padlink_host::domain::config::load_file_config;
use padlink_host::domain::{FileConfig, HostConfig, TransportMode};
use padlink_host::infrastructure::bootstrap::{BootstrapInfo, TransportBootstrapper};
use padlink_host::infrastructure::browser::SystemBrowser;
use padlink_host::infrastructure::http_server::run_server;
use padlink_host::infrastructure::input_injection::EnigoInjector;
use padlink_host::infrastructure::net::detect_lan_ip;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// PadLink host: use a phone as this computer's touch pad and keyboard.
///
/// Options left unset fall back to the config file, then to defaults.
#[derive(Debug, Parser)]
#[command(
    name = "padlink-host",
    about = "Remote mouse and keyboard server for the PadLink phone client",
    version
)]
struct Cli {
    /// Serve HTTPS and WSS instead of HTTP and WS.
    ///
    /// A self-signed certificate is generated with `openssl` when the key or
    /// certificate file is missing.
    #[arg(short = 's', long, env = "PADLINK_SECURE", overrides_with = "insecure")]
    secure: bool,

    /// Serve plain HTTP and WS even if the config file enables TLS.
    #[arg(long, env = "PADLINK_INSECURE", overrides_with = "secure")]
    insecure: bool,

    /// Preferred port; the next free port is used if it is taken.
    #[arg(long, env = "PADLINK_PORT")]
    port: Option<u16>,

    /// IP address to listen on.
    #[arg(long, env = "PADLINK_BIND")]
    bind: Option<IpAddr>,

    /// Host placed in the printed URLs instead of the detected LAN address.
    #[arg(long, env = "PADLINK_ADVERTISE_HOST")]
    advertise_host: Option<IpAddr>,

    /// TLS private key (PEM).
    #[arg(long, env = "PADLINK_KEY")]
    key: Option<PathBuf>,

    /// TLS certificate (PEM).
    #[arg(long, env = "PADLINK_CERT")]
    cert: Option<PathBuf>,

    /// Directory holding the pairing and touch-pad pages.
    #[arg(long, env = "PADLINK_PUBLIC_DIR")]
    public_dir: Option<PathBuf>,

    /// Do not open the pairing page in the local browser.
    #[arg(long, env = "PADLINK_NO_OPEN", overrides_with = "open")]
    no_open: bool,

    /// Open the pairing page even if the config file disables it.
    #[arg(long, env = "PADLINK_OPEN", overrides_with = "no_open")]
    open: bool,

    /// Press Enter after every block of typed text.
    #[arg(
        long,
        env = "PADLINK_SUBMIT_TYPED_TEXT",
        overrides_with = "no_submit_typed_text"
    )]
    submit_typed_text: bool,

    /// Type text without pressing Enter, whatever the config file says.
    #[arg(
        long,
        env = "PADLINK_NO_SUBMIT_TYPED_TEXT",
        overrides_with = "submit_typed_text"
    )]
    no_submit_typed_text: bool,

    /// How many consecutive ports to try, starting at `--port`.
    #[arg(long, env = "PADLINK_MAX_PORT_ATTEMPTS")]
    max_port_attempts: Option<u16>,

    /// TOML config file; a missing file is treated as empty.
    #[arg(long, env = "PADLINK_CONFIG")]
    config: Option<PathBuf>,
}

impl Cli {
    /// Resolves the final [`HostConfig`]: flags over file over defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read or
    /// parsed.
    fn into_host_config(self) -> anyhow::Result<HostConfig> {
        let file = match &self.config {
            Some(path) => load_file_config(path)
                .with_context(|| format!("invalid config file {}", path.display()))?,
            None => FileConfig::default(),
        };
        let mut config = HostConfig::from(file);

        if self.secure {
            config.mode = TransportMode::Secure;
        } else if self.insecure {
            config.mode = TransportMode::Plain;
        }
        if let Some(port) = self.port {
            config.preferred_port = port;
        }
        if let Some(bind) = self.bind {
            config.bind_ip = bind;
        }
        if let Some(host) = self.advertise_host {
            config.advertise_host = Some(host);
        }
        if let Some(key) = self.key {
            config.credentials.key = key;
        }
        if let Some(cert) = self.cert {
            config.credentials.cert = cert;
        }
        if let Some(dir) = self.public_dir {
            config.public_dir = dir;
        }
        if self.open {
            config.open_browser = true;
        } else if self.no_open {
            config.open_browser = false;
        }
        if self.submit_typed_text {
            config.submit_typed_text = true;
        } else if self.no_submit_typed_text {
            config.submit_typed_text = false;
        }
        if let Some(attempts) = self.max_port_attempts {
            config.max_port_attempts = attempts;
        }

        Ok(config)
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

/// Program entry point.
///
/// # What happens at startup
///
/// 1. Logging is initialised from `RUST_LOG`.
/// 2. The configuration is resolved from flags, file and defaults.
/// 3. The input injector is started and the eight commands are registered.
/// 4. The transport is bootstrapped (credentials, TLS, port, bind).  Any
///    failure here ends the process with a non-zero status.
/// 5. The URLs are printed and the pairing page is opened.
/// 6. The accept loop runs until Ctrl+C.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Cli::parse().into_host_config()?;

    info!(
        "PadLink host starting ({} mode, preferred port {})",
        config.mode.scheme(),
        config.preferred_port
    );
    if !config.public_dir.is_dir() {
        warn!(
            "public directory {} not found; only /config and WebSocket will work",
            config.public_dir.display()
        );
    }

    let injector: Arc<dyn InputInjector> =
        Arc::new(EnigoInjector::spawn().context("cannot start OS input injection")?);
    let browser: Arc<dyn BrowserLauncher> = Arc::new(SystemBrowser::new());

    let mut dispatcher = CommandDispatcher::new();
    RemoteControl::new(injector, Arc::clone(&browser))
        .with_submit_typed_text(config.submit_typed_text)
        .register_all(&mut dispatcher);
    let dispatcher = Arc::new(dispatcher);

    let advertised = config.advertise_host.unwrap_or_else(detect_lan_ip);
    let transport = TransportBootstrapper::with_openssl(config.cert_timeout)
        .start(&config, advertised)
        .await
        .context("server startup failed")?;

    announce(&transport.info);
    if config.open_browser {
        tokio::spawn(open_pairing_page(
            browser,
            transport.info.page_url("qr.html"),
        ));
    }

    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C, shutting down");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => {
                tracing::error!("failed to listen for Ctrl+C signal: {e}");
            }
        }
    });

    run_server(transport, dispatcher, config.public_dir.clone(), running).await?;

    info!("PadLink host stopped");
    Ok(())
}

fn announce(info: &BootstrapInfo) {
    info!("PadLink host ready on port {}", info.port);
    info!("  pairing page: {}", info.page_url("qr.html"));
    info!("  touch pad:    {}", info.host_url());
    if info.mode == TransportMode::Secure {
        warn!(
            "using a self-signed certificate: the phone's browser will warn once \
             before opening the touch pad"
        );
    }
}

async fn open_pairing_page(browser: Arc<dyn BrowserLauncher>, url: String) {
    let result = tokio::task::spawn_blocking(move || browser.open(&url)).await;
    match result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!("could not open the pairing page: {e}"),
        Err(e) => warn!("browser launch task failed: {e}"),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn resolve(args: &[&str]) -> HostConfig {
        let mut argv = vec!["padlink-host"];
        argv.extend_from_slice(args);
        Cli::parse_from(argv).into_host_config().unwrap()
    }

    #[test]
    fn test_cli_defaults() {
        // Arrange / Act
        let config = resolve(&[]);

        // Assert
        assert_eq!(config, HostConfig::default());
        assert_eq!(config.preferred_port, 3000);
        assert_eq!(config.mode, TransportMode::Plain);
    }

    #[test]
    fn test_cli_secure_short_flag() {
        assert_eq!(resolve(&["-s"]).mode, TransportMode::Secure);
    }

    #[test]
    fn test_cli_port_override() {
        assert_eq!(resolve(&["--port", "8443"]).preferred_port, 8443);
    }

    #[test]
    fn test_cli_paths_override() {
        let config = resolve(&["--key", "/etc/pad/k.pem", "--cert", "/etc/pad/c.pem"]);
        assert_eq!(config.credentials.key, PathBuf::from("/etc/pad/k.pem"));
        assert_eq!(config.credentials.cert, PathBuf::from("/etc/pad/c.pem"));
    }

    #[test]
    fn test_cli_switches() {
        let config = resolve(&["--no-open", "--submit-typed-text"]);
        assert!(!config.open_browser);
        assert!(config.submit_typed_text);
    }

    #[test]
    fn test_cli_advertise_host() {
        let config = resolve(&["--advertise-host", "10.1.2.3"]);
        assert_eq!(config.advertise_host, Some("10.1.2.3".parse().unwrap()));
    }

    #[test]
    fn test_cli_invalid_bind_is_rejected() {
        assert!(Cli::try_parse_from(["padlink-host", "--bind", "not.an.ip"]).is_err());
    }

    #[test]
    fn test_cli_overrides_config_file() {
        // Arrange: a file asking for port 4000, TLS and a long timeout.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("padlink.toml");
        std::fs::write(
            &path,
            "[server]\nport = 4000\nopen_browser = false\n\n[tls]\nsecure = true\ngenerate_timeout_secs = 5\n",
        )
        .unwrap();
        let path = path.to_str().unwrap();

        // Act
        let config = resolve(&["--config", path, "--port", "5000"]);

        // Assert: the flag wins, the rest comes from the file.
        assert_eq!(config.preferred_port, 5000);
        assert_eq!(config.mode, TransportMode::Secure);
        assert!(!config.open_browser);
        assert_eq!(config.cert_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_cli_negations_override_config_file() {
        // Arrange: a file turning on TLS and Enter-after-typing, and
        // turning off the browser.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("padlink.toml");
        std::fs::write(
            &path,
            "[server]\nopen_browser = false\n\n[tls]\nsecure = true\n\n[input]\nsubmit_typed_text = true\n",
        )
        .unwrap();
        let path = path.to_str().unwrap();

        // Act
        let config = resolve(&["--config", path, "--insecure", "--open", "--no-submit-typed-text"]);

        // Assert
        assert_eq!(config.mode, TransportMode::Plain);
        assert!(config.open_browser);
        assert!(!config.submit_typed_text);
    }

    #[test]
    fn test_cli_last_of_opposing_flags_wins() {
        assert_eq!(resolve(&["--secure", "--insecure"]).mode, TransportMode::Plain);
        assert_eq!(resolve(&["--insecure", "-s"]).mode, TransportMode::Secure);
        assert!(resolve(&["--no-open", "--open"]).open_browser);
        assert!(!resolve(&["--open", "--no-open"]).open_browser);
    }

    #[test]
    fn test_missing_config_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let config = resolve(&["--config", path.to_str().unwrap()]);
        assert_eq!(config, HostConfig::default());
    }

    #[test]
    fn test_malformed_config_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[server\n").unwrap();

        let result = Cli::parse_from(["padlink-host", "--config", path.to_str().unwrap()])
            .into_host_config();

        assert!(result.is_err());
    }
}
