//! Real input injection through the `enigo` crate.
//!
//! An `Enigo` handle holds a platform display connection that is not
//! guaranteed to be `Send`, so it is created on and owned by one dedicated
//! thread.  [`EnigoInjector`] forwards each call to that thread as a job and
//! blocks on the reply, which makes it usable from Tokio's blocking pool.

use std::sync::mpsc;
use std::thread;

use enigo::{Axis, Button, Coordinate, Direction, Enigo, InputResult, Key, Keyboard, Mouse, Settings};
use padlink_core::{KeyName, MouseButton};
use tracing::{debug, info};

use crate::application::ports::{ButtonAction, InjectionError, InputInjector};

type Job = Box<dyn FnOnce(&mut Enigo) + Send>;

/// [`InputInjector`] backed by a single `enigo` worker thread.
pub struct EnigoInjector {
    jobs: mpsc::Sender<Job>,
}

impl EnigoInjector {
    /// Starts the worker thread and opens the platform input connection.
    ///
    /// # Errors
    ///
    /// Returns [`InjectionError::Unavailable`] when the thread cannot be
    /// started or `enigo` cannot connect (no display, missing permission).
    pub fn spawn() -> Result<Self, InjectionError> {
        let (job_tx, job_rx) = mpsc::channel::<Job>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), String>>();

        thread::Builder::new()
            .name("padlink-input".into())
            .spawn(move || {
                let mut enigo = match Enigo::new(&Settings::default()) {
                    Ok(enigo) => {
                        let _ = ready_tx.send(Ok(()));
                        enigo
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e.to_string()));
                        return;
                    }
                };
                for job in job_rx {
                    job(&mut enigo);
                }
                debug!("input worker stopped");
            })
            .map_err(|e| InjectionError::Unavailable(format!("cannot start input thread: {e}")))?;

        match ready_rx.recv() {
            Ok(Ok(())) => {
                info!("input injector ready");
                Ok(Self { jobs: job_tx })
            }
            Ok(Err(e)) => Err(InjectionError::Unavailable(e)),
            Err(_) => Err(InjectionError::Unavailable(
                "input thread exited during startup".into(),
            )),
        }
    }

    /// Runs `op` on the worker thread and waits for its result.
    fn run<T>(
        &self,
        op: impl FnOnce(&mut Enigo) -> InputResult<T> + Send + 'static,
    ) -> Result<T, InjectionError>
    where
        T: Send + 'static,
    {
        let (reply_tx, reply_rx) = mpsc::sync_channel(1);
        self.jobs
            .send(Box::new(move |enigo: &mut Enigo| {
                let _ = reply_tx.send(op(enigo));
            }))
            .map_err(|_| stopped())?;

        reply_rx
            .recv()
            .map_err(|_| stopped())?
            .map_err(|e| InjectionError::Platform(e.to_string()))
    }
}

fn stopped() -> InjectionError {
    InjectionError::Unavailable("input thread has stopped".into())
}

impl InputInjector for EnigoInjector {
    fn mouse_position(&self) -> Result<(i32, i32), InjectionError> {
        self.run(|enigo| enigo.location())
    }

    fn move_mouse_to(&self, x: i32, y: i32) -> Result<(), InjectionError> {
        self.run(move |enigo| enigo.move_mouse(x, y, Coordinate::Abs))
    }

    fn mouse_button(&self, button: MouseButton, action: ButtonAction) -> Result<(), InjectionError> {
        let button = to_enigo_button(button);
        let direction = to_direction(action);
        self.run(move |enigo| enigo.button(button, direction))
    }

    fn scroll(&self, delta_x: i32, delta_y: i32) -> Result<(), InjectionError> {
        self.run(move |enigo| {
            if delta_x != 0 {
                enigo.scroll(delta_x, Axis::Horizontal)?;
            }
            if delta_y != 0 {
                enigo.scroll(delta_y, Axis::Vertical)?;
            }
            Ok(())
        })
    }

    fn type_text(&self, text: &str) -> Result<(), InjectionError> {
        if text.is_empty() {
            return Ok(());
        }
        let text = text.to_owned();
        self.run(move |enigo| enigo.text(&text))
    }

    fn key_tap(&self, key: KeyName) -> Result<(), InjectionError> {
        let key = to_enigo_key(key)?;
        self.run(move |enigo| enigo.key(key, Direction::Click))
    }
}

fn to_enigo_button(button: MouseButton) -> Button {
    match button {
        MouseButton::Left => Button::Left,
        MouseButton::Right => Button::Right,
        MouseButton::Middle => Button::Middle,
    }
}

fn to_direction(action: ButtonAction) -> Direction {
    match action {
        ButtonAction::Click => Direction::Click,
        ButtonAction::Press => Direction::Press,
        ButtonAction::Release => Direction::Release,
    }
}

/// Maps a key name onto the `enigo` key it taps.
fn to_enigo_key(key: KeyName) -> Result<Key, InjectionError> {
    let mapped = match key {
        KeyName::Enter => Key::Return,
        KeyName::Tab => Key::Tab,
        KeyName::Space => Key::Space,
        KeyName::Backspace => Key::Backspace,
        KeyName::Delete => Key::Delete,
        KeyName::Escape => Key::Escape,
        KeyName::Up => Key::UpArrow,
        KeyName::Down => Key::DownArrow,
        KeyName::Left => Key::LeftArrow,
        KeyName::Right => Key::RightArrow,
        KeyName::Home => Key::Home,
        KeyName::End => Key::End,
        KeyName::PageUp => Key::PageUp,
        KeyName::PageDown => Key::PageDown,
        KeyName::Shift => Key::Shift,
        KeyName::Control => Key::Control,
        KeyName::Alt => Key::Alt,
        KeyName::Command => Key::Meta,
        KeyName::Function(n) => function_key(n)?,
        KeyName::Char(c) => Key::Unicode(c),
    };
    Ok(mapped)
}

fn function_key(n: u8) -> Result<Key, InjectionError> {
    Ok(match n {
        1 => Key::F1,
        2 => Key::F2,
        3 => Key::F3,
        4 => Key::F4,
        5 => Key::F5,
        6 => Key::F6,
        7 => Key::F7,
        8 => Key::F8,
        9 => Key::F9,
        10 => Key::F10,
        11 => Key::F11,
        12 => Key::F12,
        other => {
            return Err(InjectionError::Platform(format!(
                "function key F{other} is not supported"
            )))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_keys_map() {
        assert_eq!(to_enigo_key(KeyName::Enter).unwrap(), Key::Return);
        assert_eq!(to_enigo_key(KeyName::Up).unwrap(), Key::UpArrow);
        assert_eq!(to_enigo_key(KeyName::Command).unwrap(), Key::Meta);
        assert_eq!(to_enigo_key(KeyName::Char('q')).unwrap(), Key::Unicode('q'));
    }

    #[test]
    fn test_function_keys_map_within_range() {
        assert_eq!(to_enigo_key(KeyName::Function(1)).unwrap(), Key::F1);
        assert_eq!(to_enigo_key(KeyName::Function(12)).unwrap(), Key::F12);
        assert!(to_enigo_key(KeyName::Function(13)).is_err());
    }

    #[test]
    fn test_button_and_direction_map() {
        assert_eq!(to_enigo_button(MouseButton::Middle), Button::Middle);
        assert_eq!(to_direction(ButtonAction::Press), Direction::Press);
        assert_eq!(to_direction(ButtonAction::Click), Direction::Click);
    }
}
