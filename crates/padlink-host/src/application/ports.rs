//! Outbound ports: the OS capabilities command handlers drive.
//!
//! Implementations live in the infrastructure layer (`enigo` for input,
//! the platform URL opener for the browser) and as mocks for tests.

use padlink_core::{KeyName, MouseButton};
use thiserror::Error;

/// Error type for input injection operations.
#[derive(Debug, Error)]
pub enum InjectionError {
    /// The OS rejected or failed the synthetic event.
    #[error("platform error: {0}")]
    Platform(String),
    /// The injector could not be started or has stopped.
    #[error("input injector unavailable: {0}")]
    Unavailable(String),
}

/// What to do with a mouse button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonAction {
    /// Press then release.
    Click,
    /// Press and hold.
    Press,
    Release,
}

/// OS-level mouse and keyboard synthesis.
///
/// Calls are blocking; handlers run them on Tokio's blocking pool.  No
/// ordering or mutual exclusion is promised across concurrent callers.
pub trait InputInjector: Send + Sync {
    /// Current cursor position in screen pixels.
    fn mouse_position(&self) -> Result<(i32, i32), InjectionError>;

    /// Moves the cursor to an absolute screen position.
    fn move_mouse_to(&self, x: i32, y: i32) -> Result<(), InjectionError>;

    fn mouse_button(&self, button: MouseButton, action: ButtonAction) -> Result<(), InjectionError>;

    /// Scrolls by whole wheel steps on each axis.
    fn scroll(&self, delta_x: i32, delta_y: i32) -> Result<(), InjectionError>;

    /// Types literal text.
    fn type_text(&self, text: &str) -> Result<(), InjectionError>;

    /// Presses and releases a single key.
    fn key_tap(&self, key: KeyName) -> Result<(), InjectionError>;
}

/// Error type for browser launches.
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("failed to launch `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{program}` exited with {status}")]
    Failed { program: String, status: String },
}

/// Opens URLs in the host's default browser.
pub trait BrowserLauncher: Send + Sync {
    /// Blocks until the opener command returns.
    fn open(&self, url: &str) -> Result<(), BrowserError>;
}
