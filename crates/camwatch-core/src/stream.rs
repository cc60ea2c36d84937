//! Stream Supervisor — lifecycle of the live frame stream.
//!
//! Transitions:
//!   Idle -> Loading            on attach
//!   Loading -> Live            on first successful frame
//!   Loading | Live -> Failed   on a fetch/decode error
//!   Failed -> Loading          only through an explicit retry()
//!
//! The supervisor never auto-retries out of `Failed`: a persistent outage
//! should look like one, not like a flickering sequence of transients.
//! The backend's "no frame yet" 404 leaves the state untouched.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, trace, warn};

use crate::error::ProviderError;
use crate::provider::MediaProvider;
use crate::scheduler::{schedule, Epoch, PollHandle};
use crate::view::ViewModel;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StreamState {
    /// Detached; nothing is loading.
    #[default]
    Idle,
    /// Attached, no frame has resolved yet (or a retry is under way).
    Loading,
    /// At least one frame rendered since the last (re)load.
    Live,
    /// The stream broke; holds the reason.  Only `retry()` leaves this.
    Failed(ProviderError),
}

impl StreamState {
    pub fn is_live(&self) -> bool {
        matches!(self, StreamState::Live)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, StreamState::Failed(_))
    }

    /// Short label for the stream panel.
    pub fn label(&self) -> &'static str {
        match self {
            StreamState::Idle => "IDLE",
            StreamState::Loading => "LOADING",
            StreamState::Live => "LIVE",
            StreamState::Failed(_) => "FAILED",
        }
    }
}

pub struct StreamSupervisor<P: MediaProvider> {
    provider: Arc<P>,
    view: ViewModel,
    epoch: Epoch,
    handle: Option<PollHandle>,
    /// Bumped by retry(); re-points the media URL so caches cannot replay
    /// the broken response.
    cache_bust: Arc<AtomicU64>,
}

impl<P: MediaProvider> StreamSupervisor<P> {
    pub fn new(provider: Arc<P>, view: ViewModel) -> Self {
        Self {
            provider,
            view,
            epoch: Epoch::new(),
            handle: None,
            cache_bust: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Begin loading the stream and keep it refreshed every `interval`.
    /// A second attach while already attached is a no-op.
    pub async fn attach(&mut self, interval: Duration) {
        if self.handle.is_some() {
            debug!("stream supervisor already attached");
            return;
        }
        info!("stream supervisor attaching, interval {:?}", interval);
        self.view.begin_stream().await;

        let generation = self.epoch.current();
        let provider = Arc::clone(&self.provider);
        let view = self.view.clone();
        let epoch = self.epoch.clone();
        let cache_bust = Arc::clone(&self.cache_bust);

        self.handle = Some(schedule(interval, move || {
            stream_tick(
                Arc::clone(&provider),
                view.clone(),
                epoch.clone(),
                generation,
                Arc::clone(&cache_bust),
            )
        }));
    }

    /// Explicit `Failed → Loading`.  Clears the surfaced error and
    /// re-points the media source; a no-op in any other state.
    pub async fn retry(&self) {
        self.cache_bust.fetch_add(1, Ordering::AcqRel);
        self.view.stream_retry().await;
    }

    /// Release the media resource and stop all future fetches.  Safe to
    /// call repeatedly.
    pub async fn detach(&mut self) {
        if let Some(handle) = self.handle.take() {
            info!("stream supervisor detaching");
            handle.cancel();
        }
        self.epoch.advance();
        self.view.reset_stream().await;
    }

    pub fn is_attached(&self) -> bool {
        self.handle.is_some()
    }
}

/// One supervisor cycle.  Split out so tests can drive it without the
/// timer.
pub(crate) async fn stream_tick<P: MediaProvider>(
    provider: Arc<P>,
    view: ViewModel,
    epoch: Epoch,
    generation: u64,
    cache_bust: Arc<AtomicU64>,
) {
    // While Failed, ticks are skipped — recovery is the caller's call.
    if view.state().await.stream.is_failed() {
        return;
    }

    let bust = cache_bust.load(Ordering::Acquire);
    let result = provider.fetch_frame(bust).await;

    if !epoch.is_current(generation) {
        debug!("frame response arrived after detach(), dropping");
        return;
    }

    match result {
        Ok(Some(frame)) => view.apply_frame(frame).await,
        Ok(None) => {
            // "No detection yet" — state unchanged, no error surfaced.
            trace!("no new frame from backend");
        }
        Err(err) => {
            warn!("stream fetch failed: {}", err);
            view.apply_stream_failure(err).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::FramePayload;
    use chrono::Utc;
    use std::sync::Mutex;

    fn frame() -> FramePayload {
        FramePayload {
            jpeg: vec![0xFF, 0xD8, 0xFF, 0xE0],
            received_at: Utc::now(),
        }
    }

    struct ScriptedMedia {
        responses: Mutex<Vec<Result<Option<FramePayload>, ProviderError>>>,
        seen_busts: Mutex<Vec<u64>>,
    }

    impl ScriptedMedia {
        fn new(responses: Vec<Result<Option<FramePayload>, ProviderError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses),
                seen_busts: Mutex::new(Vec::new()),
            })
        }
    }

    impl MediaProvider for ScriptedMedia {
        async fn fetch_frame(
            &self,
            cache_bust: u64,
        ) -> Result<Option<FramePayload>, ProviderError> {
            self.seen_busts.lock().unwrap().push(cache_bust);
            self.responses.lock().unwrap().remove(0)
        }
    }

    async fn tick<P: MediaProvider>(provider: &Arc<P>, view: &ViewModel, bust: &Arc<AtomicU64>) {
        let epoch = Epoch::new();
        stream_tick(
            Arc::clone(provider),
            view.clone(),
            epoch.clone(),
            epoch.current(),
            Arc::clone(bust),
        )
        .await;
    }

    #[tokio::test]
    async fn test_loading_to_live_on_first_frame() {
        let provider = ScriptedMedia::new(vec![Ok(Some(frame()))]);
        let view = ViewModel::new();
        view.begin_stream().await;
        let bust = Arc::new(AtomicU64::new(0));

        assert_eq!(view.state().await.stream, StreamState::Loading);
        tick(&provider, &view, &bust).await;

        let state = view.state().await;
        assert!(state.stream.is_live());
        assert!(state.latest_frame.is_some());
    }

    #[tokio::test]
    async fn test_404_leaves_state_unchanged() {
        let provider = ScriptedMedia::new(vec![Ok(None), Ok(Some(frame())), Ok(None)]);
        let view = ViewModel::new();
        view.begin_stream().await;
        let bust = Arc::new(AtomicU64::new(0));

        // While Loading: still Loading, no error banner.
        tick(&provider, &view, &bust).await;
        let state = view.state().await;
        assert_eq!(state.stream, StreamState::Loading);
        assert!(state.stream_error().is_none());

        // Go Live, then another 404: still Live, old frame retained.
        tick(&provider, &view, &bust).await;
        let rev_live = view.state().await.rev;
        tick(&provider, &view, &bust).await;
        let state = view.state().await;
        assert!(state.stream.is_live());
        assert_eq!(state.rev, rev_live, "no-update must not bump rev");
    }

    #[tokio::test]
    async fn test_failure_keeps_last_frame_and_blocks_ticks() {
        let provider = ScriptedMedia::new(vec![
            Ok(Some(frame())),
            Err(ProviderError::Unreachable("reset by peer".into())),
        ]);
        let view = ViewModel::new();
        view.begin_stream().await;
        let bust = Arc::new(AtomicU64::new(0));

        tick(&provider, &view, &bust).await;
        tick(&provider, &view, &bust).await;

        let state = view.state().await;
        assert!(state.stream.is_failed());
        assert!(state.stream_error().is_some());
        assert!(
            state.latest_frame.is_some(),
            "last-known frame overlays, layout must not collapse"
        );

        // A further tick is a no-op: no auto-retry, and the scripted
        // provider (now empty) is never asked for another frame.
        tick(&provider, &view, &bust).await;
        assert_eq!(provider.seen_busts.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_retry_clears_error_and_busts_cache() {
        let provider = ScriptedMedia::new(vec![
            Err(ProviderError::MediaLoad("truncated".into())),
            Ok(Some(frame())),
        ]);
        let view = ViewModel::new();
        let mut supervisor = StreamSupervisor::new(Arc::clone(&provider), view.clone());
        view.begin_stream().await;

        tick(&provider, &view, &supervisor.cache_bust).await;
        assert!(view.state().await.stream.is_failed());

        supervisor.retry().await;
        let state = view.state().await;
        assert_eq!(state.stream, StreamState::Loading);
        assert!(
            state.stream_error().is_none(),
            "error must clear before the next resolution"
        );

        tick(&provider, &view, &supervisor.cache_bust).await;
        assert!(view.state().await.stream.is_live());
        // Second fetch went out with the bumped cache-bust value.
        assert_eq!(*provider.seen_busts.lock().unwrap(), vec![0, 1]);

        supervisor.detach().await;
    }

    #[tokio::test]
    async fn test_retry_is_noop_unless_failed() {
        let provider = ScriptedMedia::new(vec![]);
        let view = ViewModel::new();
        let supervisor = StreamSupervisor::new(provider, view.clone());

        // Idle: retry must not fabricate a Loading state.
        supervisor.retry().await;
        assert_eq!(view.state().await.stream, StreamState::Idle);
    }

    #[tokio::test]
    async fn test_detach_is_idempotent() {
        let provider = ScriptedMedia::new(vec![Ok(Some(frame()))]);
        let view = ViewModel::new();
        let mut supervisor = StreamSupervisor::new(Arc::clone(&provider), view.clone());

        supervisor.attach(Duration::from_millis(50)).await;
        assert!(supervisor.is_attached());

        supervisor.detach().await;
        supervisor.detach().await;
        assert!(!supervisor.is_attached());

        let state = view.state().await;
        assert_eq!(state.stream, StreamState::Idle);
        assert!(state.latest_frame.is_none());
    }
}
