//! camwatch-core — resilient polling & streaming state management for a
//! camera/detection backend.
//!
//! The crate keeps a read-only [`ViewModel`] reconciled against an
//! unreliable HTTP backend:
//! - [`StatusPoller`] refreshes a health/status summary on a fixed cadence,
//!   with at most one request in flight and "stale, never empty" error
//!   behaviour.
//! - [`StreamSupervisor`] owns the lifecycle of the live frame stream
//!   (`Idle → Loading → Live → Failed`), with explicit retry only.
//! - [`GalleryFetcher`] replaces the saved-detections list wholesale on
//!   each one-shot fetch.
//!
//! All repeating work runs through the [`scheduler`] module, which returns
//! an owned [`PollHandle`] that cancels its timer on drop — no component
//! can leak an interval past its own teardown.

pub mod config;
pub mod error;
pub mod gallery;
pub mod provider;
pub mod scheduler;
pub mod status;
pub mod stream;
pub mod view;

pub use config::Config;
pub use error::ProviderError;
pub use gallery::{GalleryEntry, GalleryFetcher, GalleryPage};
pub use provider::{
    FramePayload, GalleryProvider, HttpProvider, MediaProvider, RawGallery, RawStatus,
    StatusProvider,
};
pub use scheduler::{schedule, Epoch, PollHandle};
pub use status::{StatusPoller, StatusSnapshot};
pub use stream::{StreamState, StreamSupervisor};
pub use view::{ViewEvent, ViewModel, ViewState};
