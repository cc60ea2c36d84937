//! End-to-end reconciliation tests driving the public API under tokio's
//! paused clock.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use camwatch_core::{
    FramePayload, MediaProvider, ProviderError, RawStatus, StatusPoller, StatusProvider,
    StreamState, StreamSupervisor, ViewModel,
};
use chrono::Utc;

fn healthy_status() -> RawStatus {
    RawStatus {
        model_loaded: true,
        camera_active: true,
        target_class_name: Some("with_card".to_string()),
    }
}

fn frame() -> FramePayload {
    FramePayload {
        jpeg: vec![0xFF, 0xD8, 0xFF, 0xE0],
        received_at: Utc::now(),
    }
}

/// Status provider whose fetches take longer than the poll interval, to
/// exercise overlap handling.
struct SlowStatus {
    delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    calls: AtomicUsize,
}

impl SlowStatus {
    fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        })
    }
}

impl StatusProvider for SlowStatus {
    async fn fetch_status(&self) -> Result<RawStatus, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let concurrent = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(concurrent, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(healthy_status())
    }
}

struct ScriptedMedia {
    responses: Mutex<Vec<Result<Option<FramePayload>, ProviderError>>>,
}

impl ScriptedMedia {
    fn new(responses: Vec<Result<Option<FramePayload>, ProviderError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses),
        })
    }
}

impl MediaProvider for ScriptedMedia {
    async fn fetch_frame(&self, _cache_bust: u64) -> Result<Option<FramePayload>, ProviderError> {
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(None)
        } else {
            responses.remove(0)
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_slow_fetches_never_overlap() {
    // Each fetch takes 5x the interval; overlapping ticks must be dropped
    // rather than queued, so the request count stays near elapsed/delay,
    // not elapsed/interval.
    let provider = SlowStatus::new(Duration::from_secs(5));
    let view = ViewModel::new();
    let mut poller = StatusPoller::new(Arc::clone(&provider), view.clone());

    poller.start(Duration::from_secs(1));
    tokio::time::sleep(Duration::from_secs(20)).await;
    poller.stop();

    assert_eq!(provider.max_in_flight.load(Ordering::SeqCst), 1);
    let calls = provider.calls.load(Ordering::SeqCst);
    assert!(
        (2..=5).contains(&calls),
        "expected skip-not-queue pacing, got {calls} calls in 20s"
    );
    assert!(!view.state().await.is_stale());
}

#[tokio::test(start_paused = true)]
async fn test_stop_discards_in_flight_response() {
    let provider = SlowStatus::new(Duration::from_secs(5));
    let view = ViewModel::new();
    let mut poller = StatusPoller::new(Arc::clone(&provider), view.clone());

    poller.start(Duration::from_secs(1));
    // Let the first fetch get going, then stop mid-flight.
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(poller.is_running());
    poller.stop();
    poller.stop();
    assert!(!poller.is_running());

    // Give the (aborted) response time it would have needed to land.
    tokio::time::sleep(Duration::from_secs(10)).await;
    let state = view.state().await;
    assert!(state.status.is_none());
    assert_eq!(state.rev, 0);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_stream_fail_retry_recover() {
    let provider = ScriptedMedia::new(vec![
        Ok(None),
        Err(ProviderError::Unreachable("connection refused".into())),
        Ok(Some(frame())),
    ]);
    let view = ViewModel::new();
    let mut supervisor = StreamSupervisor::new(Arc::clone(&provider), view.clone());

    supervisor.attach(Duration::from_secs(1)).await;
    assert_eq!(view.state().await.stream, StreamState::Loading);

    // First tick: 404, still Loading.  Second: failure.
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert!(view.state().await.stream.is_failed());

    // Ticks keep firing but the Failed state holds until a retry.
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(view.state().await.stream.is_failed());

    supervisor.retry().await;
    assert_eq!(view.state().await.stream, StreamState::Loading);
    tokio::time::sleep(Duration::from_secs(2)).await;
    let state = view.state().await;
    assert!(state.stream.is_live());
    assert!(state.latest_frame.is_some());

    supervisor.detach().await;
    let state = view.state().await;
    assert_eq!(state.stream, StreamState::Idle);
    assert!(state.latest_frame.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_restart_replaces_schedule() {
    let provider = SlowStatus::new(Duration::from_millis(10));
    let view = ViewModel::new();
    let mut poller = StatusPoller::new(Arc::clone(&provider), view.clone());

    poller.start(Duration::from_secs(1));
    tokio::time::sleep(Duration::from_millis(100)).await;
    // Restart with a slower cadence; the old schedule must not survive.
    poller.start(Duration::from_secs(60));
    // Absorb the restarted schedule's immediate first tick.
    tokio::time::sleep(Duration::from_secs(1)).await;
    let after_restart = provider.calls.load(Ordering::SeqCst);

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(provider.calls.load(Ordering::SeqCst), after_restart);
    poller.stop();
}
