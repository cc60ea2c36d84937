//! Status Poller — fixed-cadence reconciliation of backend health.
//!
//! One tokio task per poller, created through [`schedule`], so each cycle
//! runs to completion before the next tick is honoured: at most one status
//! request is ever in flight, and ticks that come due mid-fetch are
//! dropped rather than queued.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::provider::{RawStatus, StatusProvider};
use crate::scheduler::{schedule, Epoch, PollHandle};
use crate::view::ViewModel;

/// Immutable point-in-time status of the backend.  Replaced wholesale on
/// each successful poll; never patched in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub model_loaded: bool,
    pub source_active: bool,
    pub target_label: Option<String>,
    pub fetched_at: DateTime<Utc>,
}

impl StatusSnapshot {
    pub(crate) fn from_raw(raw: RawStatus) -> Self {
        Self {
            model_loaded: raw.model_loaded,
            source_active: raw.camera_active,
            target_label: raw.target_class_name,
            fetched_at: Utc::now(),
        }
    }

    /// True when the backend is fully operational.
    pub fn is_healthy(&self) -> bool {
        self.model_loaded && self.source_active
    }

    /// One-line human summary for the status header.
    pub fn summary(&self) -> String {
        let mut text = format!(
            "Model {}, Camera {}",
            if self.model_loaded { "Loaded" } else { "Not Loaded" },
            if self.source_active { "Active" } else { "Inactive" },
        );
        if self.model_loaded {
            if let Some(target) = &self.target_label {
                text.push_str(&format!(", targeting '{}'", target));
            }
        }
        text
    }
}

pub struct StatusPoller<P: StatusProvider> {
    provider: Arc<P>,
    view: ViewModel,
    epoch: Epoch,
    handle: Option<PollHandle>,
}

impl<P: StatusProvider> StatusPoller<P> {
    pub fn new(provider: Arc<P>, view: ViewModel) -> Self {
        Self {
            provider,
            view,
            epoch: Epoch::new(),
            handle: None,
        }
    }

    /// Issue an immediate fetch, then repeat every `interval`.  Calling
    /// `start` while already running replaces the previous schedule.
    pub fn start(&mut self, interval: Duration) {
        self.stop();
        info!("status poller starting, interval {:?}", interval);

        let generation = self.epoch.current();
        let provider = Arc::clone(&self.provider);
        let view = self.view.clone();
        let epoch = self.epoch.clone();

        self.handle = Some(schedule(interval, move || {
            poll_status_once(
                Arc::clone(&provider),
                view.clone(),
                epoch.clone(),
                generation,
            )
        }));
    }

    /// Cancel the schedule and discard any in-flight request.  A response
    /// that lands after `stop()` is ignored.  Idempotent.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            info!("status poller stopping");
            handle.cancel();
        }
        self.epoch.advance();
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }
}

/// One poll cycle: fetch, guard, apply.  Split out so tests can drive a
/// cycle without the timer.
pub(crate) async fn poll_status_once<P: StatusProvider>(
    provider: Arc<P>,
    view: ViewModel,
    epoch: Epoch,
    generation: u64,
) {
    let result = provider.fetch_status().await;

    if !epoch.is_current(generation) {
        debug!("status response arrived after stop(), dropping");
        return;
    }

    match result {
        Ok(raw) => view.apply_status(StatusSnapshot::from_raw(raw)).await,
        Err(err) => {
            warn!("status poll failed: {}", err);
            view.apply_status_error(err).await;
        }
    }
}
