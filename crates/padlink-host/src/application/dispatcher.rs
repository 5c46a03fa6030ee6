//! Transport-agnostic command dispatcher.
//!
//! The dispatcher owns a registry mapping command names to handlers.  It is
//! built once at startup, frozen behind an `Arc`, and shared read-only by
//! every connection.
//!
//! # Per-frame flow
//!
//! ```text
//! raw frame ──parse──▶ Envelope{event,data}
//!    │ malformed ─────────────────▶ log + drop
//!    ▼
//! registry lookup
//!    │ unknown event ─────────────▶ log + drop
//!    ▼
//! decode data into the handler's payload type
//!    │ wrong shape ───────────────▶ log + drop
//!    ▼
//! spawn isolated task ──▶ handler future
//!                           │ Err / panic ──▶ logged, never propagated
//! ```
//!
//! The receive loop never awaits a handler.  Two commands from the same
//! client may therefore run concurrently and finish in any order.  Nothing
//! that happens inside a handler can close the connection.

use std::collections::HashMap;
use std::future::Future;

use futures_util::future::{BoxFuture, FutureExt};
use futures_util::{Stream, StreamExt};
use padlink_core::Envelope;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::domain::{Connection, SessionId};

type HandlerFuture = BoxFuture<'static, anyhow::Result<()>>;

/// Decodes the payload and starts the handler future.
///
/// Decoding runs synchronously on the receive path so shape errors are
/// reported before anything is spawned.
type ErasedHandler = Box<dyn Fn(Value) -> Result<HandlerFuture, serde_json::Error> + Send + Sync>;

/// What happened to one inbound frame.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// The handler was started.  The handle always resolves to `Ok(())`,
    /// even when the handler fails or panics.
    Spawned(JoinHandle<()>),
    /// The frame was not a valid envelope.
    Malformed,
    /// No handler is registered for this event.
    UnknownEvent(String),
    /// The event is known but `data` does not match its payload type.
    InvalidPayload { event: String, reason: String },
}

impl DispatchOutcome {
    pub fn is_spawned(&self) -> bool {
        matches!(self, Self::Spawned(_))
    }
}

/// One frame as delivered by a transport, stripped of transport types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    /// Text or binary frame carrying an envelope.
    Message(Vec<u8>),
    /// Ping, pong, or other control traffic.
    Control,
    /// The peer closed the connection.
    Close,
    /// The transport failed.
    Error(String),
}

/// Per-connection counters returned when a session ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    /// Frames whose handler was started.
    pub dispatched: u64,
    /// Frames dropped as malformed, unknown, or mis-shaped.
    pub dropped: u64,
}

/// Registry of command handlers plus the dispatch logic.
#[derive(Default)]
pub struct CommandDispatcher {
    handlers: HashMap<String, ErasedHandler>,
}

impl CommandDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `name`, replacing any earlier handler for the
    /// same name.
    ///
    /// `P` is the payload type `data` is decoded into before the handler is
    /// called.
    pub fn register<P, F, Fut>(&mut self, name: impl Into<String>, handler: F) -> &mut Self
    where
        P: DeserializeOwned + Send + 'static,
        F: Fn(P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let erased: ErasedHandler = Box::new(move |data: Value| {
            let payload: P = serde_json::from_value(data)?;
            Ok(handler(payload).boxed())
        });

        let name = name.into();
        if self.handlers.insert(name.clone(), erased).is_some() {
            debug!("replaced handler for {name}");
        }
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Registered command names, sorted.
    pub fn command_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Routes one raw frame to its handler.
    ///
    /// Never fails and never blocks on the handler.  Must be called from
    /// within a Tokio runtime.
    pub fn dispatch(&self, session: SessionId, raw: &[u8]) -> DispatchOutcome {
        let envelope = match Envelope::parse(raw) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(
                    "session {session}: dropping malformed frame ({} bytes): {e}",
                    raw.len()
                );
                return DispatchOutcome::Malformed;
            }
        };

        let Envelope { event, data } = envelope;

        let Some(handler) = self.handlers.get(&event) else {
            warn!("session {session}: unknown event {event:?}");
            return DispatchOutcome::UnknownEvent(event);
        };

        let future = match handler(data) {
            Ok(future) => future,
            Err(e) => {
                warn!("session {session}: invalid payload for {event}: {e}");
                return DispatchOutcome::InvalidPayload {
                    event,
                    reason: e.to_string(),
                };
            }
        };

        debug!("session {session}: dispatching {event}");
        DispatchOutcome::Spawned(tokio::spawn(run_isolated(session, event, future)))
    }

    /// Feeds every frame of one connection through [`dispatch`](Self::dispatch)
    /// until the transport closes or fails.
    ///
    /// Returns once `connection` is `Closed`.  Handlers still running at that
    /// point are left to finish on their own.
    pub async fn attach<S>(&self, connection: &mut Connection, mut frames: S) -> SessionSummary
    where
        S: Stream<Item = InboundFrame> + Unpin,
    {
        let session = connection.id();
        let mut summary = SessionSummary::default();

        while connection.is_open() {
            match frames.next().await {
                Some(InboundFrame::Message(raw)) => {
                    // Dropping the handle detaches the task.
                    if self.dispatch(session, &raw).is_spawned() {
                        summary.dispatched += 1;
                    } else {
                        summary.dropped += 1;
                    }
                }
                Some(InboundFrame::Control) => {}
                Some(InboundFrame::Close) | None => {
                    connection.close();
                }
                Some(InboundFrame::Error(e)) => {
                    debug!("session {session}: transport error: {e}");
                    connection.close();
                }
            }
        }

        info!(
            "session {session} closed ({} dispatched, {} dropped)",
            summary.dispatched, summary.dropped
        );
        summary
    }
}

/// Runs a handler future in its own task so a panic is contained there, and
/// logs the result.
async fn run_isolated(session: SessionId, event: String, future: HandlerFuture) {
    match tokio::spawn(future).await {
        Ok(Ok(())) => debug!("session {session}: {event} completed"),
        Ok(Err(e)) => warn!("session {session}: {event} failed: {e:#}"),
        Err(e) if e.is_panic() => error!("session {session}: {event} handler panicked"),
        Err(e) => debug!("session {session}: {event} handler cancelled: {e}"),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use futures_util::stream;
    use tokio::sync::{mpsc, Notify};
    use tokio::time::timeout;

    use super::*;
    use crate::domain::ConnectionState;

    /// Dispatcher with one `echo` handler forwarding its payload to a channel.
    fn echo_dispatcher() -> (CommandDispatcher, mpsc::UnboundedReceiver<Value>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut dispatcher = CommandDispatcher::new();
        dispatcher.register("echo", move |data: Value| {
            let tx = tx.clone();
            async move {
                tx.send(data)?;
                Ok::<(), anyhow::Error>(())
            }
        });
        (dispatcher, rx)
    }

    async fn join(outcome: DispatchOutcome) {
        match outcome {
            DispatchOutcome::Spawned(handle) => timeout(Duration::from_secs(2), handle)
                .await
                .expect("handler task must finish")
                .expect("outer task never fails"),
            other => panic!("expected Spawned, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_known_event_reaches_handler() {
        // Arrange
        let (dispatcher, mut rx) = echo_dispatcher();

        // Act
        let outcome = dispatcher.dispatch(SessionId::new(), br#"{"event":"echo","data":[1,2]}"#);
        join(outcome).await;

        // Assert
        assert_eq!(rx.recv().await.unwrap(), serde_json::json!([1, 2]));
    }

    #[tokio::test]
    async fn test_last_registration_wins() {
        let (tx, mut rx) = mpsc::unbounded_channel::<&'static str>();
        let mut dispatcher = CommandDispatcher::new();
        let first = tx.clone();
        dispatcher.register("cmd", move |_: Value| {
            let tx = first.clone();
            async move {
                tx.send("first")?;
                Ok::<(), anyhow::Error>(())
            }
        });
        dispatcher.register("cmd", move |_: Value| {
            let tx = tx.clone();
            async move {
                tx.send("second")?;
                Ok::<(), anyhow::Error>(())
            }
        });

        join(dispatcher.dispatch(SessionId::new(), br#"{"event":"cmd"}"#)).await;

        assert_eq!(dispatcher.len(), 1);
        assert_eq!(rx.recv().await.unwrap(), "second");
    }

    #[tokio::test]
    async fn test_unknown_event_is_dropped() {
        let (dispatcher, mut rx) = echo_dispatcher();

        let outcome = dispatcher.dispatch(SessionId::new(), br#"{"event":"cmd_teleport","data":1}"#);

        assert!(matches!(outcome, DispatchOutcome::UnknownEvent(ref e) if e == "cmd_teleport"));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_malformed_frame_is_dropped() {
        let (dispatcher, _rx) = echo_dispatcher();
        let outcome = dispatcher.dispatch(SessionId::new(), b"\xff\xfe not json");
        assert!(matches!(outcome, DispatchOutcome::Malformed));
    }

    #[tokio::test]
    async fn test_array_frame_is_malformed() {
        // Arrange
        let (dispatcher, mut rx) = echo_dispatcher();

        // Act: the right fields in field order, but not an object.
        let outcome = dispatcher.dispatch(SessionId::new(), br#"["echo",{"amount":5}]"#);

        // Assert
        assert!(matches!(outcome, DispatchOutcome::Malformed));
        assert!(rx.try_recv().is_err(), "handler must not run");
    }

    #[tokio::test]
    async fn test_mis_shaped_payload_never_reaches_handler() {
        // Arrange: a handler whose payload must be a u32.
        let (tx, mut rx) = mpsc::unbounded_channel::<u32>();
        let mut dispatcher = CommandDispatcher::new();
        dispatcher.register("num", move |n: u32| {
            let tx = tx.clone();
            async move {
                tx.send(n)?;
                Ok::<(), anyhow::Error>(())
            }
        });

        // Act
        let outcome = dispatcher.dispatch(SessionId::new(), br#"{"event":"num","data":"seven"}"#);

        // Assert
        assert!(matches!(outcome, DispatchOutcome::InvalidPayload { ref event, .. } if event == "num"));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_failing_handler_is_contained() {
        async fn failing(_: Value) -> anyhow::Result<()> {
            anyhow::bail!("injector exploded")
        }
        let mut dispatcher = CommandDispatcher::new();
        dispatcher.register("boom", failing);

        // `join` asserts the outer task resolves Ok(()).
        join(dispatcher.dispatch(SessionId::new(), br#"{"event":"boom"}"#)).await;
    }

    #[tokio::test]
    async fn test_panicking_handler_is_contained() {
        async fn exploding(_: Value) -> anyhow::Result<()> {
            panic!("handler bug")
        }
        let mut dispatcher = CommandDispatcher::new();
        dispatcher.register("panic", exploding);

        join(dispatcher.dispatch(SessionId::new(), br#"{"event":"panic"}"#)).await;
    }

    #[tokio::test]
    async fn test_handlers_are_not_serialised() {
        // Arrange: `wait` blocks until `release` runs.  If dispatch awaited
        // each handler, `wait` would never finish.
        let gate = Arc::new(Notify::new());
        let mut dispatcher = CommandDispatcher::new();
        let waiter = Arc::clone(&gate);
        dispatcher.register("wait", move |_: Value| {
            let gate = Arc::clone(&waiter);
            async move {
                gate.notified().await;
                Ok::<(), anyhow::Error>(())
            }
        });
        dispatcher.register("release", move |_: Value| {
            let gate = Arc::clone(&gate);
            async move {
                gate.notify_one();
                Ok::<(), anyhow::Error>(())
            }
        });
        let session = SessionId::new();

        // Act
        let first = dispatcher.dispatch(session, br#"{"event":"wait"}"#);
        let second = dispatcher.dispatch(session, br#"{"event":"release"}"#);

        // Assert
        join(first).await;
        join(second).await;
    }

    #[tokio::test]
    async fn test_attach_survives_bad_frames_and_closes_on_close() {
        // Arrange
        let (dispatcher, mut rx) = echo_dispatcher();
        let mut connection = Connection::open(None);
        let frames = stream::iter(vec![
            InboundFrame::Message(b"garbage".to_vec()),
            InboundFrame::Message(br#"{"event":"nope"}"#.to_vec()),
            InboundFrame::Control,
            InboundFrame::Message(br#"{"event":"echo","data":"still here"}"#.to_vec()),
            InboundFrame::Close,
            InboundFrame::Message(br#"{"event":"echo","data":"after close"}"#.to_vec()),
        ]);

        // Act
        let summary = dispatcher.attach(&mut connection, frames).await;

        // Assert
        assert_eq!(summary, SessionSummary { dispatched: 1, dropped: 2 });
        assert_eq!(connection.state(), ConnectionState::Closed);
        let received = timeout(Duration::from_secs(2), rx.recv()).await.unwrap().unwrap();
        assert_eq!(received, serde_json::json!("still here"));
        assert!(timeout(Duration::from_millis(100), rx.recv()).await.is_err());
    }

    #[tokio::test]
    async fn test_attach_closes_on_transport_error() {
        let (dispatcher, _rx) = echo_dispatcher();
        let mut connection = Connection::open(None);
        let frames = stream::iter(vec![InboundFrame::Error("reset by peer".to_string())]);

        let summary = dispatcher.attach(&mut connection, frames).await;

        assert_eq!(summary, SessionSummary::default());
        assert!(!connection.is_open());
    }

    #[tokio::test]
    async fn test_attach_closes_when_stream_ends() {
        let (dispatcher, _rx) = echo_dispatcher();
        let mut connection = Connection::open(None);
        dispatcher.attach(&mut connection, stream::empty()).await;
        assert!(!connection.is_open());
    }

    #[test]
    fn test_command_names_sorted() {
        let mut dispatcher = CommandDispatcher::new();
        dispatcher.register("b", |_: Value| async { Ok::<(), anyhow::Error>(()) });
        dispatcher.register("a", |_: Value| async { Ok::<(), anyhow::Error>(()) });
        assert_eq!(dispatcher.command_names(), vec!["a", "b"]);
        assert!(dispatcher.contains("a"));
        assert!(!dispatcher.is_empty());
    }
}
