//! HTTP and WebSocket serving on the bootstrapped listener.
//!
//! One listening socket carries everything:
//!
//! - `GET /config` returns `{"hostUrl": "<scheme>://<host>:<port>/index.html"}`
//! - a WebSocket upgrade on any path starts a command session
//! - every other request is answered from the public directory
//!
//! Connections are accepted by a loop polling a shared `running` flag every
//! 200 ms, the same shutdown contract as the rest of the host.  Each accepted
//! connection (after the TLS handshake in secure mode) gets its own task
//! running hyper's HTTP/1.1 server with upgrades enabled, so plain and TLS
//! streams go through one code path.

use std::io::ErrorKind;
use std::net::SocketAddr;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, State};
use axum::http::{header, Request, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use futures_util::StreamExt;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use percent_encoding::percent_decode_str;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::TlsAcceptor;
use tower_service::Service;
use tracing::{debug, error, info, warn};

use crate::application::dispatcher::{CommandDispatcher, InboundFrame};
use crate::domain::Connection;
use crate::infrastructure::bootstrap::{BootstrapInfo, BoundTransport};

/// How often the accept loop re-checks the `running` flag.
const ACCEPT_POLL: Duration = Duration::from_millis(200);

/// Upper bound on a TLS handshake before the connection is dropped.
const TLS_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared state for every request handler.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<CommandDispatcher>,
    pub info: Arc<BootstrapInfo>,
    pub public_dir: Arc<PathBuf>,
}

impl AppState {
    pub fn new(dispatcher: Arc<CommandDispatcher>, info: BootstrapInfo, public_dir: PathBuf) -> Self {
        Self {
            dispatcher,
            info: Arc::new(info),
            public_dir: Arc::new(public_dir),
        }
    }
}

/// Body of `GET /config`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigResponse {
    pub host_url: String,
}

/// Builds the request router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/config", get(config_handler))
        .fallback(fallback_handler)
        .with_state(state)
}

// ── Accept loop ───────────────────────────────────────────────────────────────

/// Serves `transport` until `running` is cleared.
///
/// Sessions already in progress are not interrupted; they end with the
/// process.
pub async fn run_server(
    transport: BoundTransport,
    dispatcher: Arc<CommandDispatcher>,
    public_dir: PathBuf,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    let BoundTransport { listener, tls, info } = transport;
    let app = router(AppState::new(dispatcher, info, public_dir));

    loop {
        if !running.load(Ordering::Relaxed) {
            info!("shutdown flag set; stopping accept loop");
            break;
        }

        match timeout(ACCEPT_POLL, listener.accept()).await {
            Ok(Ok((stream, peer))) => {
                debug!("connection from {peer}");
                let app = app.clone();
                let tls = tls.clone();
                tokio::spawn(async move {
                    serve_connection(stream, peer, tls, app).await;
                });
            }
            Ok(Err(e)) => {
                // Transient (for example too many open files); keep serving.
                error!("accept error: {e}");
            }
            Err(_) => {}
        }
    }

    Ok(())
}

async fn serve_connection(stream: TcpStream, peer: SocketAddr, tls: Option<TlsAcceptor>, app: Router) {
    let Some(acceptor) = tls else {
        serve_http(stream, peer, app).await;
        return;
    };

    match timeout(TLS_HANDSHAKE_TIMEOUT, acceptor.accept(stream)).await {
        Ok(Ok(tls_stream)) => serve_http(tls_stream, peer, app).await,
        Ok(Err(e)) => debug!("TLS handshake with {peer} failed: {e}"),
        Err(_) => debug!("TLS handshake with {peer} timed out"),
    }
}

async fn serve_http<I>(io: I, peer: SocketAddr, app: Router)
where
    I: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let service = service_fn(move |mut request: Request<Incoming>| {
        request.extensions_mut().insert(ConnectInfo(peer));
        app.clone().call(request)
    });

    if let Err(e) = http1::Builder::new()
        .serve_connection(TokioIo::new(io), service)
        .with_upgrades()
        .await
    {
        debug!("connection {peer} ended: {e}");
    }
}

// ── Handlers ──────────────────────────────────────────────────────────────────

async fn config_handler(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    ws: Option<WebSocketUpgrade>,
) -> Response {
    if let Some(ws) = ws {
        return upgrade(ws, &state, peer);
    }
    Json(ConfigResponse {
        host_url: state.info.host_url(),
    })
    .into_response()
}

async fn fallback_handler(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    ws: Option<WebSocketUpgrade>,
    uri: Uri,
) -> Response {
    if let Some(ws) = ws {
        return upgrade(ws, &state, peer);
    }
    serve_static(&state.public_dir, uri.path()).await
}

fn upgrade(ws: WebSocketUpgrade, state: &AppState, peer: Option<ConnectInfo<SocketAddr>>) -> Response {
    let dispatcher = Arc::clone(&state.dispatcher);
    let peer = peer.map(|ConnectInfo(addr)| addr);
    ws.on_upgrade(move |socket| run_ws_session(socket, dispatcher, peer))
}

async fn run_ws_session(socket: WebSocket, dispatcher: Arc<CommandDispatcher>, peer: Option<SocketAddr>) {
    let mut connection = Connection::open(peer);
    match peer {
        Some(addr) => info!("session {} opened from {addr}", connection.id()),
        None => info!("session {} opened", connection.id()),
    }

    let frames = Box::pin(socket.map(to_inbound_frame));
    dispatcher.attach(&mut connection, frames).await;
}

fn to_inbound_frame(item: Result<Message, axum::Error>) -> InboundFrame {
    match item {
        Ok(Message::Text(text)) => InboundFrame::Message(text.into_bytes()),
        Ok(Message::Binary(bytes)) => InboundFrame::Message(bytes),
        Ok(Message::Ping(_) | Message::Pong(_)) => InboundFrame::Control,
        Ok(Message::Close(_)) => InboundFrame::Close,
        Err(e) => InboundFrame::Error(e.to_string()),
    }
}

// ── Static files ──────────────────────────────────────────────────────────────

async fn serve_static(public_dir: &Path, request_path: &str) -> Response {
    let Some(relative) = public_relative_path(request_path) else {
        warn!("refusing path outside the public directory: {request_path}");
        return StatusCode::FORBIDDEN.into_response();
    };

    let path = public_dir.join(&relative);
    match tokio::fs::metadata(&path).await {
        Ok(meta) if meta.is_file() => {}
        Ok(_) => return StatusCode::NOT_FOUND.into_response(),
        Err(e) if e.kind() == ErrorKind::NotFound => return StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            warn!("cannot stat {}: {e}", path.display());
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    }

    match tokio::fs::read(&path).await {
        Ok(bytes) => ([(header::CONTENT_TYPE, content_type(&path))], bytes).into_response(),
        Err(e) if e.kind() == ErrorKind::NotFound => StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            warn!("cannot read {}: {e}", path.display());
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Maps a request path onto a path relative to the public directory.
///
/// Each segment is percent-decoded before it is checked, so `%2e%2e` is
/// still `..`.  `/` and any path ending in `/` resolve to `index.html`.
/// Returns `None` for paths that try to leave the directory and for
/// segments that do not decode to UTF-8.
fn public_relative_path(request_path: &str) -> Option<PathBuf> {
    let mut relative = PathBuf::new();
    for raw in request_path.split('/') {
        let segment = percent_decode_str(raw).decode_utf8().ok()?;
        match segment.as_ref() {
            "" | "." => {}
            ".." => return None,
            s if s.contains(['/', '\\', ':', '\0']) => return None,
            s => relative.push(s),
        }
    }

    // A segment like "C:" could still carry a prefix on Windows.
    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return None;
    }

    if request_path.ends_with('/') || relative.as_os_str().is_empty() {
        relative.push("index.html");
    }
    Some(relative)
}

fn content_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("js" | "mjs") => "text/javascript; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
