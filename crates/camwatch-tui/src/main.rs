mod app;
mod theme;
mod ui;

use std::sync::Arc;

use camwatch_core::{Config, GalleryFetcher, HttpProvider, StatusPoller, StreamSupervisor, ViewModel};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let data_dir = dirs::data_dir()
        .map(|p| p.join("camwatch"))
        .unwrap_or_else(|| std::env::temp_dir().join("camwatch"));
    std::fs::create_dir_all(&data_dir)?;

    let log_path = data_dir.join("camwatch.log");
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    // Allow RUST_LOG override; default to debug for app code but suppress noisy
    // connection-level DEBUG from HTTP client internals (hyper_util, reqwest).
    let log_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "debug,hyper_util=warn,reqwest=warn,hyper=warn".to_string());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    // Print log path to stderr so the operator can tail it immediately.
    eprintln!("camwatch log: {}", log_path.display());

    tracing::info!("camwatch starting…");

    let config = Config::load().unwrap_or_default();

    let provider = Arc::new(HttpProvider::new(&config.backend)?);
    let view = ViewModel::new();

    let mut poller = StatusPoller::new(Arc::clone(&provider), view.clone());
    poller.start(config.polling.status_interval());

    let mut supervisor = StreamSupervisor::new(Arc::clone(&provider), view.clone());
    supervisor.attach(config.polling.frame_interval()).await;

    let gallery = GalleryFetcher::new(Arc::clone(&provider), view.clone());

    let app = app::App::new(config, view, poller, supervisor, gallery);
    app.run().await?;

    tracing::info!("camwatch exiting");
    Ok(())
}
