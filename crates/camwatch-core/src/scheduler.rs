//! Scheduler — the owning abstraction for repeating timed callbacks.
//!
//! Every polling component in this crate gets its timer from [`schedule`]
//! and holds the returned [`PollHandle`].  Cancelling (or just dropping)
//! the handle stops all future callbacks, so a torn-down view cannot leave
//! an orphaned interval firing behind it.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Opaque handle to a scheduled repeating task.
///
/// Owns exactly one underlying timer task.  `cancel()` is idempotent and
/// always stops future callbacks; dropping the handle cancels too.
#[derive(Debug)]
pub struct PollHandle {
    task: JoinHandle<()>,
}

impl PollHandle {
    pub fn cancel(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Spawn a repeating async callback.  The first tick fires immediately;
/// subsequent ticks every `interval`.  A tick that comes due while the
/// previous callback is still running is dropped, not queued, so a slow
/// backend can never build up a request backlog.
///
/// Must be called from within a tokio runtime.
pub fn schedule<F, Fut>(interval: Duration, mut tick: F) -> PollHandle
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send,
{
    assert!(interval > Duration::ZERO, "poll interval must be positive");

    let task = tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            timer.tick().await;
            tick().await;
        }
    });

    PollHandle { task }
}

/// Generation counter implementing the "still mounted" guard.
///
/// A component captures the current generation when it issues a request and
/// checks it again when the response lands; `advance()` at teardown makes
/// every captured generation stale, so a late-arriving response can never
/// mutate state after `stop()`/`detach()`.
#[derive(Debug, Clone, Default)]
pub struct Epoch(Arc<AtomicU64>);

impl Epoch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generation to capture at request-issue time.
    pub fn current(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }

    /// Invalidate every previously captured generation.
    pub fn advance(&self) -> u64 {
        self.0.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.current() == generation
    }
}
