//! Opening URLs in the host's default browser.
//!
//! Uses the platform's own URL opener so no browser is hard-coded:
//!
//! | Platform | Command                                   |
//! |----------|-------------------------------------------|
//! | Linux    | `xdg-open <url>`                          |
//! | macOS    | `open <url>`                              |
//! | Windows  | `rundll32 url.dll,FileProtocolHandler <url>` |
//!
//! The URL is always passed as a single argument and never through a shell.

use std::process::{Command, Stdio};
use std::sync::{Mutex, PoisonError};
use std::thread;

use tracing::debug;

use crate::application::ports::{BrowserError, BrowserLauncher};

/// [`BrowserLauncher`] using the platform URL opener.
///
/// `open` returns once the opener has been spawned. Some openers stay
/// alive for as long as the browser does, so the child is reaped on a
/// detached thread instead of being waited on.
#[derive(Debug, Clone)]
pub struct SystemBrowser {
    program: String,
    args: Vec<String>,
}

impl SystemBrowser {
    pub fn new() -> Self {
        Self::with_program(OPENER, OPENER_ARGS)
    }

    /// Uses `program`, with `args` placed before the URL.
    pub fn with_program(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_owned(),
            args: args.iter().map(|a| (*a).to_owned()).collect(),
        }
    }
}

impl Default for SystemBrowser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(target_os = "windows")]
const OPENER: &str = "rundll32";
#[cfg(target_os = "windows")]
const OPENER_ARGS: &[&str] = &["url.dll,FileProtocolHandler"];

#[cfg(target_os = "macos")]
const OPENER: &str = "open";
#[cfg(target_os = "macos")]
const OPENER_ARGS: &[&str] = &[];

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
const OPENER: &str = "xdg-open";
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
const OPENER_ARGS: &[&str] = &[];

impl BrowserLauncher for SystemBrowser {
    fn open(&self, url: &str) -> Result<(), BrowserError> {
        debug!("launching {} for {url}", self.program);

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| BrowserError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let program = self.program.clone();
        thread::spawn(move || match child.wait() {
            Ok(status) if !status.success() => debug!("{program} exited with {status}"),
            Ok(_) => {}
            Err(e) => debug!("could not wait for {program}: {e}"),
        });
        Ok(())
    }
}

/// Browser launcher that records URLs instead of opening them.
#[derive(Debug, Default)]
pub struct MockBrowserLauncher {
    pub opened: Mutex<Vec<String>>,
    /// When `true`, `open` fails and records nothing.
    pub should_fail: bool,
}

impl MockBrowserLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl BrowserLauncher for MockBrowserLauncher {
    fn open(&self, url: &str) -> Result<(), BrowserError> {
        if self.should_fail {
            return Err(BrowserError::Failed {
                program: "mock".into(),
                status: "mock failure".into(),
            });
        }
        self.opened
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(url.to_owned());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::{Duration, Instant};

    #[test]
    fn test_opener_matches_platform() {
        let browser = SystemBrowser::new();
        #[cfg(target_os = "linux")]
        assert_eq!(browser.program, "xdg-open");
        #[cfg(target_os = "macos")]
        assert_eq!(browser.program, "open");
        #[cfg(target_os = "windows")]
        assert_eq!(browser.program, "rundll32");
    }

    #[cfg(unix)]
    #[test]
    fn test_long_running_opener_does_not_block() {
        // Arrange: an opener that outlives the call, like a browser
        // started in the foreground. `sleep` takes the "URL" as seconds.
        let browser = SystemBrowser::with_program("sleep", &[]);

        // Act
        let started = Instant::now();
        let result = browser.open("5");

        // Assert
        assert!(result.is_ok());
        assert!(
            started.elapsed() < Duration::from_secs(1),
            "open waited {:?} for the opener",
            started.elapsed()
        );
    }

    #[test]
    fn test_missing_opener_is_a_spawn_error() {
        let browser = SystemBrowser::with_program("padlink-no-such-opener", &[]);

        let result = browser.open("https://a.test");

        assert!(matches!(result, Err(BrowserError::Spawn { .. })));
    }

    #[test]
    fn test_mock_records_in_order() {
        let browser = MockBrowserLauncher::new();
        browser.open("https://a.test").unwrap();
        browser.open("https://b.test").unwrap();
        assert_eq!(browser.opened(), vec!["https://a.test", "https://b.test"]);
    }
}
