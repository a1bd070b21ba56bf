//! # Streaming Renderer
//!
//! Reveals raw text one character per tick and re-formats the revealed
//! prefix on every tick.
//!
//! ```text
//!   Idle ──start──▶ Streaming ──last char──▶ Complete
//!    ▲                  │
//!    └──────cancel──────┘        (start again from any state)
//! ```
//!
//! [`StreamingSession`] is the pure state machine; [`StreamingRenderer`]
//! drives it on a tokio timer, one session at a time.

use crate::pipeline::{format, render_html};
use folio_parser::Document;
use parking_lot::Mutex;
use serde::Serialize;
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum StreamState {
    #[default]
    Idle,
    Streaming,
    Complete,
}

/// Formatted view of the revealed prefix
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamFrame {
    pub state: StreamState,
    pub revealed_len: usize,
    pub total_len: usize,
    pub document: Document,
    pub html: String,
}

/// Reveal state over one raw text. Lengths count characters, not bytes.
#[derive(Debug, Clone)]
pub struct StreamingSession {
    source: String,
    /// Byte offset just past each character
    boundaries: Vec<usize>,
    revealed: usize,
    state: StreamState,
}

impl StreamingSession {
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        let boundaries: Vec<usize> = source
            .char_indices()
            .map(|(offset, ch)| offset + ch.len_utf8())
            .collect();
        let state = if boundaries.is_empty() {
            StreamState::Complete
        } else {
            StreamState::Streaming
        };

        Self {
            source,
            boundaries,
            revealed: 0,
            state,
        }
    }

    pub fn len(&self) -> usize {
        self.boundaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boundaries.is_empty()
    }

    pub fn revealed_len(&self) -> usize {
        self.revealed
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    pub fn is_complete(&self) -> bool {
        self.state == StreamState::Complete
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn revealed_text(&self) -> &str {
        match self.revealed {
            0 => "",
            n => &self.source[..self.boundaries[n - 1]],
        }
    }

    /// Reveal one more character. Returns `None` once complete.
    pub fn advance(&mut self) -> Option<StreamFrame> {
        if self.is_complete() {
            return None;
        }

        self.revealed += 1;
        if self.revealed == self.len() {
            self.state = StreamState::Complete;
        }
        Some(self.frame())
    }

    pub fn frame(&self) -> StreamFrame {
        let document = format(self.revealed_text());
        let html = render_html(&document);
        StreamFrame {
            state: self.state,
            revealed_len: self.revealed,
            total_len: self.len(),
            document,
            html,
        }
    }

    pub fn document(&self) -> Document {
        format(self.revealed_text())
    }
}

/// Frame published to subscribers, stamped with the session that produced it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamDisplay {
    pub session_id: u64,
    pub frame: StreamFrame,
}

struct ActiveSession {
    id: u64,
    cancel: CancellationToken,
}

struct RendererInner {
    tick: Duration,
    next_id: AtomicU64,
    active: Mutex<Option<ActiveSession>>,
    display: watch::Sender<StreamDisplay>,
}

impl RendererInner {
    /// Publish a frame if `id` is still the active session
    fn publish(&self, id: u64, frame: StreamFrame) -> bool {
        let active = self.active.lock();
        match active.as_ref() {
            Some(session) if session.id == id && !session.cancel.is_cancelled() => {
                self.display.send_replace(StreamDisplay {
                    session_id: id,
                    frame,
                });
                true
            }
            _ => false,
        }
    }

    fn finish(&self, id: u64) {
        let mut active = self.active.lock();
        if active.as_ref().map(|session| session.id) == Some(id) {
            *active = None;
        }
    }

    /// Drop a cancelled session and reset the display if it was still showing
    fn abandon(&self, id: u64) {
        let mut active = self.active.lock();
        if active.as_ref().map(|session| session.id) == Some(id) {
            *active = None;
            self.display.send_replace(StreamDisplay {
                session_id: id,
                frame: StreamFrame::default(),
            });
        }
    }
}

/// Shared by renderer clones but never by the drive task, so dropping the
/// last clone cancels the active session.
struct RendererOwner(Arc<RendererInner>);

impl Deref for RendererOwner {
    type Target = RendererInner;

    fn deref(&self) -> &RendererInner {
        &self.0
    }
}

impl Drop for RendererOwner {
    fn drop(&mut self) {
        let active = self.0.active.lock().take();
        if let Some(session) = active {
            debug!(session = session.id, "renderer dropped, cancelling session");
            session.cancel.cancel();
        }
    }
}

/// Drives one streaming session at a time; starting a new one cancels the
/// previous session.
#[derive(Clone)]
pub struct StreamingRenderer {
    inner: Arc<RendererOwner>,
}

/// Handle to one started session
pub struct StreamHandle {
    id: u64,
    cancel: CancellationToken,
    done: oneshot::Receiver<Document>,
}

impl StreamHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Final document, or `None` if the session was cancelled or superseded
    pub async fn finished(self) -> Option<Document> {
        self.done.await.ok()
    }
}

impl StreamingRenderer {
    pub fn new(tick: Duration) -> Self {
        let (display, _) = watch::channel(StreamDisplay::default());
        Self {
            inner: Arc::new(RendererOwner(Arc::new(RendererInner {
                tick,
                next_id: AtomicU64::new(1),
                active: Mutex::new(None),
                display,
            }))),
        }
    }

    pub fn tick(&self) -> Duration {
        self.inner.tick
    }

    /// Start streaming `raw`, cancelling any session in progress.
    /// Must be called from within a tokio runtime.
    pub fn start(&self, raw: impl Into<String>) -> StreamHandle {
        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
        let cancel = CancellationToken::new();

        {
            let mut active = self.inner.active.lock();
            if let Some(previous) = active.replace(ActiveSession {
                id,
                cancel: cancel.clone(),
            }) {
                debug!(session = previous.id, "superseding streaming session");
                previous.cancel.cancel();
            }
        }

        let session = StreamingSession::new(raw);
        debug!(session = id, chars = session.len(), "streaming session started");
        self.inner.publish(id, session.frame());

        let (done_tx, done_rx) = oneshot::channel();
        tokio::spawn(drive(self.inner.0.clone(), id, session, cancel.clone(), done_tx));

        StreamHandle {
            id,
            cancel,
            done: done_rx,
        }
    }

    /// Cancel the active session, if any. Its partial output is discarded.
    pub fn cancel(&self) {
        let previous = self.inner.active.lock().take();
        if let Some(session) = previous {
            session.cancel.cancel();
            self.inner.display.send_replace(StreamDisplay {
                session_id: session.id,
                frame: StreamFrame::default(),
            });
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<StreamDisplay> {
        self.inner.display.subscribe()
    }

    pub fn state(&self) -> StreamState {
        self.inner.display.borrow().frame.state
    }

    pub fn current(&self) -> StreamDisplay {
        self.inner.display.borrow().clone()
    }
}

impl Default for StreamingRenderer {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_STREAM_TICK)
    }
}

async fn drive(
    inner: Arc<RendererInner>,
    id: u64,
    mut session: StreamingSession,
    cancel: CancellationToken,
    done: oneshot::Sender<Document>,
) {
    while !session.is_complete() {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!(session = id, "streaming session cancelled");
                inner.abandon(id);
                return;
            }
            _ = tokio::time::sleep(inner.tick) => {}
        }

        let Some(frame) = session.advance() else {
            break;
        };
        let revealed = frame.revealed_len;
        if !inner.publish(id, frame) {
            return;
        }
        debug!(session = id, revealed, "stream tick");
    }

    inner.finish(id);
    info!(session = id, chars = session.len(), "streaming complete");
    let _ = done.send(session.document());
}
