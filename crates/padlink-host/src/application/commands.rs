//! The remote-control command set.
//!
//! [`RemoteControl`] binds the eight wire commands to the [`InputInjector`]
//! and [`BrowserLauncher`] ports and registers them on a
//! [`CommandDispatcher`].
//!
//! | Command           | Effect                                              |
//! |-------------------|-----------------------------------------------------|
//! | `cmd_goto`        | open the URL in the default browser                 |
//! | `cmd_mouse_move`  | move the cursor by `delta × MOUSE_SPEED`            |
//! | `cmd_mouse_click` | click the button                                    |
//! | `cmd_mouse_down`  | press and hold the button                           |
//! | `cmd_mouse_up`    | release the button                                  |
//! | `cmd_type`        | type the text (plus Enter when configured)          |
//! | `cmd_scroll`      | scroll vertically by `amount × SCROLL_SPEED`        |
//! | `cmd_key_tap`     | tap one key                                         |
//!
//! Every OS call is blocking, so each runs on Tokio's blocking pool.

use std::sync::Arc;

use anyhow::Context;
use padlink_core::protocol::commands::{
    CMD_GOTO, CMD_KEY_TAP, CMD_MOUSE_CLICK, CMD_MOUSE_DOWN, CMD_MOUSE_MOVE, CMD_MOUSE_UP,
    CMD_SCROLL, CMD_TYPE,
};
use padlink_core::{GotoTarget, KeyName, MouseButton, MouseDelta, ScrollDelta, TypedText};
use tracing::{debug, info};

use crate::application::dispatcher::CommandDispatcher;
use crate::application::ports::{BrowserLauncher, ButtonAction, InjectionError, InputInjector};

/// Cursor pixels per touch-pad delta unit.
pub const MOUSE_SPEED: f64 = 2.0;

/// Wheel steps per scroll amount unit.
pub const SCROLL_SPEED: f64 = 1.0;

/// Command handlers sharing one injector and one browser launcher.
pub struct RemoteControl {
    injector: Arc<dyn InputInjector>,
    browser: Arc<dyn BrowserLauncher>,
    submit_typed_text: bool,
}

impl RemoteControl {
    pub fn new(injector: Arc<dyn InputInjector>, browser: Arc<dyn BrowserLauncher>) -> Self {
        Self {
            injector,
            browser,
            submit_typed_text: false,
        }
    }

    /// Press Enter after every `cmd_type`.
    pub fn with_submit_typed_text(mut self, submit: bool) -> Self {
        self.submit_typed_text = submit;
        self
    }

    /// Registers all eight commands on `dispatcher`.
    pub fn register_all(self, dispatcher: &mut CommandDispatcher) {
        let this = Arc::new(self);

        let ctl = Arc::clone(&this);
        dispatcher.register(CMD_GOTO, move |target: GotoTarget| Arc::clone(&ctl).goto(target));

        let ctl = Arc::clone(&this);
        dispatcher.register(CMD_MOUSE_MOVE, move |delta: MouseDelta| {
            Arc::clone(&ctl).mouse_move(delta)
        });

        let ctl = Arc::clone(&this);
        dispatcher.register(CMD_MOUSE_CLICK, move |button: Option<MouseButton>| {
            Arc::clone(&ctl).mouse_button(button.unwrap_or_default(), ButtonAction::Click)
        });

        let ctl = Arc::clone(&this);
        dispatcher.register(CMD_MOUSE_DOWN, move |button: Option<MouseButton>| {
            Arc::clone(&ctl).mouse_button(button.unwrap_or_default(), ButtonAction::Press)
        });

        let ctl = Arc::clone(&this);
        dispatcher.register(CMD_MOUSE_UP, move |button: Option<MouseButton>| {
            Arc::clone(&ctl).mouse_button(button.unwrap_or_default(), ButtonAction::Release)
        });

        let ctl = Arc::clone(&this);
        dispatcher.register(CMD_TYPE, move |text: TypedText| Arc::clone(&ctl).type_text(text));

        let ctl = Arc::clone(&this);
        dispatcher.register(CMD_SCROLL, move |delta: ScrollDelta| {
            Arc::clone(&ctl).scroll(delta)
        });

        dispatcher.register(CMD_KEY_TAP, move |key: KeyName| Arc::clone(&this).key_tap(key));
    }

    async fn goto(self: Arc<Self>, target: GotoTarget) -> anyhow::Result<()> {
        info!("opening {target} in the default browser");
        let browser = Arc::clone(&self.browser);
        run_blocking(move || browser.open(target.as_str())).await
    }

    async fn mouse_move(self: Arc<Self>, delta: MouseDelta) -> anyhow::Result<()> {
        let injector = Arc::clone(&self.injector);
        run_blocking(move || {
            let origin = injector.mouse_position()?;
            let (x, y) = delta.target_from(origin, MOUSE_SPEED);
            injector.move_mouse_to(x, y)
        })
        .await
    }

    async fn mouse_button(
        self: Arc<Self>,
        button: MouseButton,
        action: ButtonAction,
    ) -> anyhow::Result<()> {
        debug!("mouse {button:?} {action:?}");
        let injector = Arc::clone(&self.injector);
        run_blocking(move || injector.mouse_button(button, action)).await
    }

    async fn type_text(self: Arc<Self>, text: TypedText) -> anyhow::Result<()> {
        debug!("typing {text:?}");
        let injector = Arc::clone(&self.injector);
        let submit = self.submit_typed_text;
        run_blocking(move || {
            injector.type_text(text.as_str())?;
            if submit {
                injector.key_tap(KeyName::Enter)?;
            }
            Ok::<(), InjectionError>(())
        })
        .await
    }

    async fn scroll(self: Arc<Self>, delta: ScrollDelta) -> anyhow::Result<()> {
        let injector = Arc::clone(&self.injector);
        let steps = delta.vertical_steps(SCROLL_SPEED);
        run_blocking(move || injector.scroll(0, steps)).await
    }

    async fn key_tap(self: Arc<Self>, key: KeyName) -> anyhow::Result<()> {
        debug!("tapping {key}");
        let injector = Arc::clone(&self.injector);
        run_blocking(move || injector.key_tap(key)).await
    }
}

/// Runs a blocking OS call on the blocking pool and flattens both failure
/// layers into one error.
async fn run_blocking<E>(op: impl FnOnce() -> Result<(), E> + Send + 'static) -> anyhow::Result<()>
where
    E: std::error::Error + Send + Sync + 'static,
{
    tokio::task::spawn_blocking(op)
        .await
        .context("blocking OS call did not complete")??;
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
