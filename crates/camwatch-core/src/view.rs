//! View Model — shared read-only state for rendering.
//!
//! Renderers read [`ViewState`] snapshots and subscribe to [`ViewEvent`]
//! change notifications, but never mutate: every mutator is crate-private
//! and only the pollers/supervisor write here.  `rev` is a monotonically
//! increasing counter bumped on every accepted change.

use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};
use tracing::debug;

use crate::error::ProviderError;
use crate::gallery::GalleryEntry;
use crate::provider::FramePayload;
use crate::status::StatusSnapshot;
use crate::stream::StreamState;

/// Change notifications; receivers re-read `ViewModel::state()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewEvent {
    StatusUpdated,
    StreamUpdated,
    GalleryUpdated,
}

#[derive(Debug, Clone, Default)]
pub struct ViewState {
    /// Monotonic revision counter — incremented on every accepted change.
    pub rev: u64,
    /// Latest accepted status snapshot.  Retained across poll failures so
    /// the UI degrades to "stale" rather than "empty".
    pub status: Option<StatusSnapshot>,
    /// Set while the last status poll failed; cleared on the next success.
    pub status_error: Option<ProviderError>,
    pub stream: StreamState,
    /// Last frame that reached `Live`.  Kept through `Failed` so recovery
    /// can overlay rather than collapse the frame area.
    pub latest_frame: Option<FramePayload>,
    pub gallery: Vec<GalleryEntry>,
}

impl ViewState {
    /// True when the displayed status is a retained snapshot from before
    /// the current run of poll failures.
    pub fn is_stale(&self) -> bool {
        self.status_error.is_some()
    }

    /// The stream error, surfaced only while the stream is `Failed`.
    pub fn stream_error(&self) -> Option<&ProviderError> {
        match &self.stream {
            StreamState::Failed(err) => Some(err),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ViewModel {
    inner: Arc<RwLock<ViewState>>,
    tx: broadcast::Sender<ViewEvent>,
}

impl Default for ViewModel {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewModel {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(64);
        Self {
            inner: Arc::new(RwLock::new(ViewState::default())),
            tx,
        }
    }

    pub async fn state(&self) -> ViewState {
        self.inner.read().await.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ViewEvent> {
        self.tx.subscribe()
    }

    // ── Status ────────────────────────────────────────────────────────────────

    pub(crate) async fn apply_status(&self, snapshot: StatusSnapshot) {
        {
            let mut state = self.inner.write().await;
            // fetched_at moves strictly forward across accepted snapshots.
            if let Some(prev) = &state.status {
                if snapshot.fetched_at <= prev.fetched_at {
                    debug!(
                        "dropping status snapshot with non-increasing timestamp {}",
                        snapshot.fetched_at
                    );
                    return;
                }
            }
            state.status = Some(snapshot);
            state.status_error = None;
            state.rev += 1;
        }
        let _ = self.tx.send(ViewEvent::StatusUpdated);
    }

    /// Record a poll failure.  The previous snapshot stays in place.
    pub(crate) async fn apply_status_error(&self, err: ProviderError) {
        {
            let mut state = self.inner.write().await;
            state.status_error = Some(err);
            state.rev += 1;
        }
        let _ = self.tx.send(ViewEvent::StatusUpdated);
    }

    // ── Stream ────────────────────────────────────────────────────────────────

    /// `Idle → Loading` on attach.
    pub(crate) async fn begin_stream(&self) {
        {
            let mut state = self.inner.write().await;
            if state.stream != StreamState::Idle {
                return;
            }
            state.stream = StreamState::Loading;
            state.rev += 1;
        }
        let _ = self.tx.send(ViewEvent::StreamUpdated);
    }

    /// `Loading | Live → Live` with a fresh frame.  Ignored while `Idle`
    /// (detached) or `Failed` (awaiting explicit retry).
    pub(crate) async fn apply_frame(&self, frame: FramePayload) {
        {
            let mut state = self.inner.write().await;
            match state.stream {
                StreamState::Loading | StreamState::Live => {
                    state.stream = StreamState::Live;
                    state.latest_frame = Some(frame);
                    state.rev += 1;
                }
                StreamState::Idle | StreamState::Failed(_) => return,
            }
        }
        let _ = self.tx.send(ViewEvent::StreamUpdated);
    }

    /// `Loading | Live → Failed(reason)`.  The last-known frame is kept.
    pub(crate) async fn apply_stream_failure(&self, err: ProviderError) {
        {
            let mut state = self.inner.write().await;
            if state.stream == StreamState::Idle {
                return;
            }
            state.stream = StreamState::Failed(err);
            state.rev += 1;
        }
        let _ = self.tx.send(ViewEvent::StreamUpdated);
    }

    /// `Failed → Loading` — the only path out of `Failed`.  Leaving the
    /// `Failed` variant is what clears the surfaced error, so no stale
    /// error can show during the reload.
    pub(crate) async fn stream_retry(&self) {
        {
            let mut state = self.inner.write().await;
            if !matches!(state.stream, StreamState::Failed(_)) {
                return;
            }
            state.stream = StreamState::Loading;
            state.rev += 1;
        }
        let _ = self.tx.send(ViewEvent::StreamUpdated);
    }

    /// Back to `Idle`, dropping the retained frame.  Idempotent.
    pub(crate) async fn reset_stream(&self) {
        {
            let mut state = self.inner.write().await;
            if state.stream == StreamState::Idle && state.latest_frame.is_none() {
                return;
            }
            state.stream = StreamState::Idle;
            state.latest_frame = None;
            state.rev += 1;
        }
        let _ = self.tx.send(ViewEvent::StreamUpdated);
    }

    // ── Gallery ───────────────────────────────────────────────────────────────

    /// Replace the entry list wholesale — the provider owns the top-N set.
    pub(crate) async fn set_gallery(&self, entries: Vec<GalleryEntry>) {
        {
            let mut state = self.inner.write().await;
            state.gallery = entries;
            state.rev += 1;
        }
        let _ = self.tx.send(ViewEvent::GalleryUpdated);
    }
}
