//! Recording input injector for tests.
//!
//! [`MockInputInjector`] performs no OS calls.  Every successful call is
//! appended to one ordered event log, so tests can assert both what was
//! injected and in which order (for example text followed by Enter).
//!
//! ```ignore
//! let injector = Arc::new(MockInputInjector::with_position(100, 100));
//! // ... dispatch cmd_mouse_move {x: 3, y: -2} ...
//! assert_eq!(injector.events(), vec![InjectedEvent::MoveTo(106, 96)]);
//! ```

use std::sync::{Mutex, MutexGuard, PoisonError};

use padlink_core::{KeyName, MouseButton};

use crate::application::ports::{ButtonAction, InjectionError, InputInjector};

/// One recorded injector call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InjectedEvent {
    MoveTo(i32, i32),
    Button(MouseButton, ButtonAction),
    Scroll(i32, i32),
    Text(String),
    KeyTap(KeyName),
}

/// An injector that records calls instead of performing them.
#[derive(Default)]
pub struct MockInputInjector {
    /// Cursor position reported by `mouse_position`; updated by `move_mouse_to`.
    pub position: Mutex<(i32, i32)>,
    pub events: Mutex<Vec<InjectedEvent>>,
    /// When `true`, every method returns `InjectionError::Platform` and
    /// nothing is recorded.
    pub should_fail: bool,
}

impl MockInputInjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts with the cursor at `(x, y)`.
    pub fn with_position(x: i32, y: i32) -> Self {
        Self {
            position: Mutex::new((x, y)),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    /// Snapshot of the event log.
    pub fn events(&self) -> Vec<InjectedEvent> {
        lock(&self.events).clone()
    }

    fn record(&self, event: InjectedEvent) -> Result<(), InjectionError> {
        self.check()?;
        lock(&self.events).push(event);
        Ok(())
    }

    fn check(&self) -> Result<(), InjectionError> {
        if self.should_fail {
            return Err(InjectionError::Platform("mock failure".into()));
        }
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl InputInjector for MockInputInjector {
    fn mouse_position(&self) -> Result<(i32, i32), InjectionError> {
        self.check()?;
        Ok(*lock(&self.position))
    }

    fn move_mouse_to(&self, x: i32, y: i32) -> Result<(), InjectionError> {
        self.record(InjectedEvent::MoveTo(x, y))?;
        *lock(&self.position) = (x, y);
        Ok(())
    }

    fn mouse_button(&self, button: MouseButton, action: ButtonAction) -> Result<(), InjectionError> {
        self.record(InjectedEvent::Button(button, action))
    }

    fn scroll(&self, delta_x: i32, delta_y: i32) -> Result<(), InjectionError> {
        self.record(InjectedEvent::Scroll(delta_x, delta_y))
    }

    fn type_text(&self, text: &str) -> Result<(), InjectionError> {
        self.record(InjectedEvent::Text(text.to_owned()))
    }

    fn key_tap(&self, key: KeyName) -> Result<(), InjectionError> {
        self.record(InjectedEvent::KeyTap(key))
    }
}
