//! gphotos-sync: incremental Google Photos downloader.
//!
//! Walks the Photos Library `mediaItems` listing newest-first, stores each
//! item under `<directory>/<YYYY>/<MM>/`, and remembers the newest item it
//! saw so the next run can stop where this one started. Name collisions are
//! resolved by content: identical bytes are stored once, different bytes get
//! a ` (N)` suffix.

#![warn(clippy::all)]

mod cli;
mod config;
mod download;
mod library;
mod state;
mod types;

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use download::{PageWalker, WalkState};
use library::{BearerSession, LibrarySession, MediaLibrary};
use state::MarkerStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cli.log_level.as_filter())),
        )
        .init();

    let config = config::Config::from_cli(cli)?;
    tracing::debug!(?config, "Parsed configuration");
    tracing::info!(
        directory = %config.directory.display(),
        "Starting gphotos-sync"
    );

    let session: Arc<dyn LibrarySession> = Arc::new(BearerSession::new(
        reqwest::Client::new(),
        config.access_token.clone(),
    ));
    let library = MediaLibrary::new(session, config.page_size);
    let markers = MarkerStore::new(&config.marker_file);
    tracing::debug!("Marker file: {}", markers.path().display());
    let download_config = config.download_config();

    // Loaded once; each walk hands back the marker the next one starts from.
    let mut marker = markers.load()?;

    loop {
        let walker = PageWalker::new(&library, &markers, &download_config);
        let report = walker.run(marker.take()).await?;
        marker = report.marker;

        let Some(interval) = config.watch_with_interval else {
            if report.state == WalkState::Aborted {
                anyhow::bail!("Sync aborted: the library listing could not be fetched");
            }
            break;
        };

        if report.state == WalkState::Aborted {
            tracing::warn!("Sync aborted, retrying from the first page next cycle");
        }
        tracing::info!("Waiting {} seconds...", interval);
        tokio::time::sleep(std::time::Duration::from_secs(interval)).await;
    }

    Ok(())
}
