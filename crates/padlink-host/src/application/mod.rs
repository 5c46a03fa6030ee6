//! Application layer: the command dispatcher, the remote-control command set
//! and the ports they drive.

pub mod commands;
pub mod dispatcher;
pub mod ports;

pub use commands::{RemoteControl, MOUSE_SPEED, SCROLL_SPEED};
pub use dispatcher::{CommandDispatcher, DispatchOutcome, InboundFrame, SessionSummary};
pub use ports::{BrowserError, BrowserLauncher, ButtonAction, InjectionError, InputInjector};
