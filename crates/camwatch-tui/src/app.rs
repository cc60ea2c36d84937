//! App — event loop wiring the view model to the terminal.
//!
//! Architecture:
//! - `camwatch-core` reconciles [`ViewState`] in the background; the app
//!   holds the latest snapshot and redraws when a change event arrives.
//! - A `tokio::mpsc` channel carries `AppMessage` events in from background
//!   tasks (keyboard reader, view-change bridge, gallery fetches).
//! - All writes to the view go through the core components the app owns;
//!   the snapshot itself is read-only rendering input.

use std::io;
use std::time::Duration;

use ratatui::crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use camwatch_core::{
    Config, GalleryFetcher, GalleryProvider, MediaProvider, ProviderError, StatusPoller,
    StatusProvider, StreamSupervisor, ViewModel, ViewState,
};

use crate::ui;

// ── Internal event bus ────────────────────────────────────────────────────────

enum AppMessage {
    Event(Event),
    /// The core changed the view; re-read the snapshot.
    ViewChanged,
    GalleryDone(Result<usize, ProviderError>),
}

const GALLERY_REFRESH_SECS: u64 = 30;

// ── App ───────────────────────────────────────────────────────────────────────

pub struct App<P>
where
    P: StatusProvider + MediaProvider + GalleryProvider,
{
    config: Config,
    view: ViewModel,
    poller: StatusPoller<P>,
    supervisor: StreamSupervisor<P>,
    gallery: GalleryFetcher<P>,

    /// Last snapshot taken from the view model; rendering reads only this.
    snapshot: ViewState,
    gallery_in_flight: bool,
    /// One-line notice for gallery failures (stream/status errors render
    /// from the snapshot itself).
    banner: Option<String>,
    should_quit: bool,
}

impl<P> App<P>
where
    P: StatusProvider + MediaProvider + GalleryProvider,
{
    pub fn new(
        config: Config,
        view: ViewModel,
        poller: StatusPoller<P>,
        supervisor: StreamSupervisor<P>,
        gallery: GalleryFetcher<P>,
    ) -> Self {
        Self {
            config,
            view,
            poller,
            supervisor,
            gallery,
            snapshot: ViewState::default(),
            gallery_in_flight: false,
            banner: None,
            should_quit: false,
        }
    }

    // ── Main run loop ─────────────────────────────────────────────────────────

    pub async fn run(mut self) -> anyhow::Result<()> {
        debug!("run(): enabling raw mode");
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        debug!("run(): terminal created, size={:?}", terminal.size());

        let (tx, mut rx) = mpsc::channel::<AppMessage>(1024);

        // ── Background task: keyboard events ──────────────────────────────────
        let event_tx = tx.clone();
        tokio::task::spawn_blocking(move || loop {
            match event::read() {
                Ok(ev) => {
                    if event_tx.blocking_send(AppMessage::Event(ev)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        });

        // ── Background task: view-change bridge ───────────────────────────────
        let bridge_tx = tx.clone();
        let mut view_rx = self.view.subscribe();
        tokio::spawn(async move {
            loop {
                match view_rx.recv().await {
                    Ok(_) => {
                        if bridge_tx.send(AppMessage::ViewChanged).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        // Events are only redraw hints; the snapshot re-read
                        // catches us up, so a lag is harmless.
                        warn!("view event receiver lagged by {} messages", n);
                        if bridge_tx.send(AppMessage::ViewChanged).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        // ── Periodic gallery refresh ──────────────────────────────────────────
        let mut gallery_refresh =
            tokio::time::interval(Duration::from_secs(GALLERY_REFRESH_SECS));
        gallery_refresh.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        self.snapshot = self.view.state().await;

        // ── Main loop ─────────────────────────────────────────────────────────
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                let polling = self.poller.is_running();
                terminal.draw(|f| {
                    ui::draw(f, &self.snapshot, polling, self.banner.as_deref())
                })?;
            }
            needs_redraw = false;

            if self.should_quit {
                break;
            }

            tokio::select! {
                Some(msg) = rx.recv() => {
                    needs_redraw = self.handle_message(msg, &tx).await;
                }
                _ = gallery_refresh.tick() => {
                    self.spawn_gallery_fetch(&tx);
                }
            }
        }

        // ── Teardown ──────────────────────────────────────────────────────────
        self.poller.stop();
        self.supervisor.detach().await;
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        Ok(())
    }

    async fn handle_message(&mut self, msg: AppMessage, tx: &mpsc::Sender<AppMessage>) -> bool {
        match msg {
            AppMessage::Event(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                self.handle_key(key.code, tx).await
            }
            AppMessage::Event(Event::Resize(..)) => true,
            AppMessage::Event(_) => false,
            AppMessage::ViewChanged => {
                self.snapshot = self.view.state().await;
                true
            }
            AppMessage::GalleryDone(result) => {
                self.gallery_in_flight = false;
                match result {
                    Ok(count) => {
                        info!("gallery refreshed, {} entries", count);
                        self.banner = None;
                    }
                    Err(err) => {
                        // Non-blocking: the previous list stays on screen.
                        self.banner = Some(format!("gallery refresh failed: {err}"));
                    }
                }
                true
            }
        }
    }

    async fn handle_key(&mut self, code: KeyCode, tx: &mpsc::Sender<AppMessage>) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.should_quit = true;
                true
            }
            // Retry the stream after a failure.
            KeyCode::Char('r') => {
                self.supervisor.retry().await;
                false
            }
            // Manual gallery refresh.
            KeyCode::Char('g') => {
                self.spawn_gallery_fetch(tx);
                false
            }
            // Pause/resume status polling.
            KeyCode::Char('s') => {
                if self.poller.is_running() {
                    self.poller.stop();
                } else {
                    self.poller.start(self.config.polling.status_interval());
                }
                true
            }
            _ => false,
        }
    }

    /// One-shot gallery fetch on a background task; at most one at a time.
    fn spawn_gallery_fetch(&mut self, tx: &mpsc::Sender<AppMessage>) {
        if self.gallery_in_flight {
            debug!("gallery fetch already in flight, skipping");
            return;
        }
        self.gallery_in_flight = true;
        let fetcher = self.gallery.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            let result = fetcher.fetch_once().await.map(|page| page.len());
            let _ = tx.send(AppMessage::GalleryDone(result)).await;
        });
    }
}
