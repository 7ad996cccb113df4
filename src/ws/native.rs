//! Native WebSocket session over `tokio-tungstenite`.
//!
//! - One background tokio task per session owns the socket
//! - The public handle talks to it over an mpsc command channel
//! - Events are delivered in order through a bounded channel
//! - WS-level pings are answered; binary frames are ignored
//! - No reconnection: a failed or dropped session ends with `Closed`
//!
//! `Open` and `Message` are dropped with a warning when the consumer lags
//! and the channel is full. `Error` and `Closed` use slots reserved when
//! the session is created, so they always arrive. The event stream ends
//! after `Closed`.

use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream, Stream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc::{self, OwnedPermit};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::error::WsError;
use crate::ws::{ReadyState, WsConfig, WsEvent};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Close code reported when the socket went away without a close frame.
pub const ABNORMAL_CLOSE: u16 = 1006;

const CLOSE_WAIT: Duration = Duration::from_secs(5);

/// Channel slots held back for `Error` and `Closed`.
const TERMINAL_SLOTS: usize = 2;

/// Take one slot of `tx`'s capacity for a later send.
pub(crate) fn reserve_slot<T>(tx: &mpsc::Sender<T>) -> Option<OwnedPermit<T>> {
    tx.clone().try_reserve_owned().ok()
}

/// Queue `event` without waiting; dropped with a warning when the channel is full.
pub(crate) fn try_emit<T: std::fmt::Debug>(tx: &mpsc::Sender<T>, event: T) {
    match tx.try_send(event) {
        Ok(()) => {}
        Err(mpsc::error::TrySendError::Full(event)) => {
            tracing::warn!("Event channel full, dropping {:?}", event);
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {}
    }
}

// ─── Commands from public API to background task ─────────────────────────────

enum Command {
    Close,
}

// ─── Shared close bookkeeping ────────────────────────────────────────────────

/// Guards the single `Closed` event of a session.
///
/// Shared by the handle and the task; whichever closes first sends through
/// the reserved slot. Once the slot is spent no sender is left behind it.
#[derive(Clone)]
struct CloseLatch {
    slot: Arc<Mutex<Option<OwnedPermit<WsEvent>>>>,
    emitted: Arc<AtomicBool>,
    ready_state: Arc<AtomicU16>,
}

impl CloseLatch {
    fn new(slot: Option<OwnedPermit<WsEvent>>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(slot)),
            emitted: Arc::new(AtomicBool::new(false)),
            ready_state: Arc::new(AtomicU16::new(ReadyState::Connecting as u16)),
        }
    }

    fn set_state(&self, state: ReadyState) {
        self.ready_state.store(state as u16, Ordering::SeqCst);
    }

    /// Emit `Closed` unless it already went out.
    fn close(&self, code: Option<u16>, reason: impl Into<String>) -> bool {
        self.set_state(ReadyState::Closed);
        if self.emitted.swap(true, Ordering::SeqCst) {
            return false;
        }
        let reason = reason.into();
        tracing::info!("WebSocket closed: code={:?} reason={}", code, reason);
        let permit = self.slot.lock().ok().and_then(|mut guard| guard.take());
        match permit {
            Some(permit) => {
                permit.send(WsEvent::Closed { code, reason });
            }
            None => tracing::warn!("No slot left for the close event"),
        }
        true
    }
}

// ─── Background task state ───────────────────────────────────────────────────

struct TaskState {
    config: WsConfig,
    cmd_rx: mpsc::Receiver<Command>,
    event_tx: mpsc::Sender<WsEvent>,
    error_slot: Option<OwnedPermit<WsEvent>>,
    latch: CloseLatch,
}

impl TaskState {
    fn emit(&self, event: WsEvent) {
        try_emit(&self.event_tx, event);
    }

    /// A session fails at most once; later errors fall back to a plain send.
    fn emit_error(&mut self, error: WsError) {
        match self.error_slot.take() {
            Some(permit) => {
                permit.send(WsEvent::Error(error));
            }
            None => self.emit(WsEvent::Error(error)),
        }
    }
}

// ─── Public WsSession ────────────────────────────────────────────────────────

/// One WebSocket session.
///
/// Created connected-or-connecting; the background task reports `Open`
/// once the handshake completes.
pub struct WsSession {
    url: String,
    cmd_tx: mpsc::Sender<Command>,
    event_rx: tokio::sync::Mutex<mpsc::Receiver<WsEvent>>,
    task_handle: Mutex<Option<JoinHandle<()>>>,
    latch: CloseLatch,
    closing: AtomicBool,
}

impl WsSession {
    /// Open a session to `config.url`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn connect(config: WsConfig) -> Result<Self, WsError> {
        if config.url.trim().is_empty() {
            return Err(WsError::ConnectionFailed("Empty URL".into()));
        }
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| WsError::ConnectionFailed(e.to_string()))?;

        let capacity = config.event_channel_capacity.max(1) + TERMINAL_SLOTS;
        let (event_tx, event_rx) = mpsc::channel(capacity);
        let (cmd_tx, cmd_rx) = mpsc::channel(4);
        let error_slot = reserve_slot(&event_tx);
        let latch = CloseLatch::new(reserve_slot(&event_tx));

        let url = config.url.clone();
        let state = TaskState {
            config,
            cmd_rx,
            event_tx,
            error_slot,
            latch: latch.clone(),
        };
        let handle = runtime.spawn(run_task(state));

        Ok(Self {
            url,
            cmd_tx,
            event_rx: tokio::sync::Mutex::new(event_rx),
            task_handle: Mutex::new(Some(handle)),
            latch,
            closing: AtomicBool::new(false),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Whether the WebSocket is currently open.
    pub fn is_open(&self) -> bool {
        self.ready_state() == ReadyState::Open
    }

    /// Current connection state.
    pub fn ready_state(&self) -> ReadyState {
        ReadyState::from(self.latch.ready_state.load(Ordering::SeqCst))
    }

    /// Whether `Closed` has been emitted.
    pub fn is_closed(&self) -> bool {
        self.latch.emitted.load(Ordering::SeqCst)
    }

    /// Close the session. Only the first call does anything.
    ///
    /// Sends a normal close frame (if open) and waits for the background
    /// task to finish. On return `Closed` has been queued.
    pub async fn close(&self) -> Result<(), WsError> {
        if self.closing.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        if !self.is_closed() {
            self.latch.set_state(ReadyState::Closing);
        }
        let _ = self.cmd_tx.send(Command::Close).await;

        let handle = self.task_handle.lock().ok().and_then(|mut guard| guard.take());
        if let Some(mut handle) = handle {
            if tokio::time::timeout(CLOSE_WAIT, &mut handle).await.is_err() {
                tracing::warn!("WebSocket task did not exit within {:?}", CLOSE_WAIT);
                handle.abort();
                let _ = handle.await;
            }
        }

        // The task normally emits this itself.
        self.latch.close(Some(1000), "Client close");
        Ok(())
    }

    /// Wait for the next event. `None` once `Closed` has been taken.
    pub async fn next_event(&self) -> Option<WsEvent> {
        let mut guard = self.event_rx.lock().await;
        guard.recv().await
    }

    /// Get a stream of events from the session; it ends after `Closed`.
    ///
    /// The returned stream borrows `self`.
    pub fn events(&self) -> Pin<Box<dyn Stream<Item = WsEvent> + Send + '_>> {
        Box::pin(futures_util::stream::unfold(
            &self.event_rx,
            |rx| async move {
                let mut guard = rx.lock().await;
                guard.recv().await.map(|event| (event, rx))
            },
        ))
    }
}

impl Drop for WsSession {
    fn drop(&mut self) {
        if let Ok(mut guard) = self.task_handle.lock() {
            if let Some(handle) = guard.take() {
                handle.abort();
            }
        }
    }
}

// ─── Background task ─────────────────────────────────────────────────────────

async fn run_task(mut state: TaskState) {
    let timeout = Duration::from_millis(state.config.connect_timeout_ms);

    // ── 1. Connect, unless closed first ─────────────────────────────────
    let attempt = tokio::select! {
        res = attempt_connect(&state.config.url, timeout) => Some(res),
        _ = state.cmd_rx.recv() => None,
    };
    let (sink, stream) = match attempt {
        Some(Ok(parts)) => parts,
        Some(Err(e)) => {
            tracing::error!("WebSocket connection failed: {}", e);
            state.emit_error(WsError::ConnectionFailed(e.clone()));
            state.latch.close(Some(ABNORMAL_CLOSE), e);
            return;
        }
        None => {
            state.latch.close(Some(1000), "Closed before open");
            return;
        }
    };

    // ── 2. Connected ─────────────────────────────────────────────────────
    state.latch.set_state(ReadyState::Open);
    tracing::info!("WebSocket open: {}", state.config.url);
    state.emit(WsEvent::Open);

    // ── 3. Read until either side closes ─────────────────────────────────
    let (code, reason) = run_connected(&mut state, sink, stream).await;
    state.latch.close(code, reason);
}

/// The connected loop; returns the close code and reason.
async fn run_connected(
    state: &mut TaskState,
    mut sink: SplitSink<WsStream, Message>,
    mut stream: SplitStream<WsStream>,
) -> (Option<u16>, String) {
    loop {
        tokio::select! {
            // ── a) Incoming WS message ───────────────────────────────────
            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let text: &str = text.as_ref();
                        state.emit(WsEvent::Message(text.to_owned()));
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if let Err(e) = sink.send(Message::Pong(data)).await {
                            tracing::warn!("Failed to answer ping: {}", e);
                        }
                    }
                    Some(Ok(Message::Close(frame))) => {
                        let (code, reason) = extract_close(frame.as_ref());
                        return (Some(code), reason);
                    }
                    Some(Ok(Message::Binary(data))) => {
                        tracing::debug!("Ignoring {} byte binary frame", data.len());
                    }
                    Some(Ok(_)) => {} // Pong, Frame
                    Some(Err(e)) => {
                        let reason = e.to_string();
                        tracing::error!("WebSocket error: {}", reason);
                        state.emit_error(WsError::ProtocolError(reason.clone()));
                        return (Some(ABNORMAL_CLOSE), reason);
                    }
                    None => {
                        return (Some(ABNORMAL_CLOSE), "Stream ended".into());
                    }
                }
            }

            // ── b) Close requested (or handle dropped) ───────────────────
            _ = state.cmd_rx.recv() => {
                if let Err(e) = sink.send(Message::Close(Some(CloseFrame {
                    code: CloseCode::Normal,
                    reason: "Client close".into(),
                }))).await {
                    tracing::debug!("Close frame not sent: {}", e);
                }
                return (Some(1000), "Client close".into());
            }
        }
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

async fn attempt_connect(
    url: &str,
    timeout: Duration,
) -> Result<(SplitSink<WsStream, Message>, SplitStream<WsStream>), String> {
    let (ws_stream, _) = tokio::time::timeout(timeout, connect_async(url))
        .await
        .map_err(|_| "Connection timeout".to_string())?
        .map_err(|e| e.to_string())?;

    Ok(ws_stream.split())
}

/// Extract close code and reason from an optional CloseFrame.
fn extract_close(frame: Option<&CloseFrame>) -> (u16, String) {
    match frame {
        Some(f) => (f.code.into(), f.reason.to_string()),
        None => (ABNORMAL_CLOSE, "No close frame".into()),
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
