//! [`InputInjector`](crate::application::ports::InputInjector)
//! implementations.
//!
//! `enigo` covers Windows, macOS and X11 behind one API, so a single real
//! implementation serves every platform.

pub mod enigo;
pub mod mock;

pub use self::enigo::EnigoInjector;
pub use mock::{InjectedEvent, MockInputInjector};
