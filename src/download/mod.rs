//! Sync engine: walks the remote listing page by page and brings each item
//! into the local dated folder tree.
//!
//! Everything runs strictly in listing order: one page request, then each of
//! its items (existence check, download, collision-safe write), then the next
//! page. A page that cannot be fetched ends the walk; an item that cannot be
//! downloaded is logged and skipped.

pub mod dedup;
pub mod error;
pub mod file;
pub mod paths;

use std::fs::FileTimes;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use chrono::Local;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::fs;

use crate::library::{MediaItem, MediaLibrary};
use crate::state::{MarkerStore, SyncMarker};
use dedup::WriteOutcome;

pub use error::SyncError;

/// Subset of application config consumed by the sync engine.
/// Decoupled from CLI parsing so the engine can be tested independently.
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    pub(crate) directory: PathBuf,
    pub(crate) folder_structure: String,
    /// Stop the walk at the item recorded by the previous fresh walk.
    pub(crate) stop_at_marker: bool,
    pub(crate) dry_run: bool,
    pub(crate) no_progress_bar: bool,
}

/// What happened to a single listed item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    Downloaded(PathBuf),
    /// Downloaded, but identical content was already stored at `of`.
    Duplicate { of: PathBuf },
    /// A file already exists at the target path; no request was made.
    SkippedExisting,
    /// The content request failed; the walk moved on.
    Failed,
    /// Dry run: would have been downloaded.
    DryRun,
}

/// Terminal state of a walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkState {
    /// The listing ran out of pages.
    Completed,
    /// The walk reached the item recorded by a previous walk.
    ReachedMarker,
    /// A page request failed. The next walk starts from the beginning and
    /// stops at the marker this one started with.
    Aborted,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkStats {
    pub pages: usize,
    pub downloaded: usize,
    pub duplicates: usize,
    pub skipped: usize,
    pub failed: usize,
    pub dry_run: usize,
}

impl WalkStats {
    fn record(&mut self, outcome: &ItemOutcome) {
        match outcome {
            ItemOutcome::Downloaded(_) => self.downloaded += 1,
            ItemOutcome::Duplicate { .. } => self.duplicates += 1,
            ItemOutcome::SkippedExisting => self.skipped += 1,
            ItemOutcome::Failed => self.failed += 1,
            ItemOutcome::DryRun => self.dry_run += 1,
        }
    }

    pub fn items(&self) -> usize {
        self.downloaded + self.duplicates + self.skipped + self.failed + self.dry_run
    }
}

#[derive(Debug, Clone)]
pub struct WalkReport {
    pub state: WalkState,
    /// Marker the next walk should stop at: the one recorded by this walk
    /// when it completed or reached the previous marker, otherwise the marker
    /// it started with.
    pub marker: Option<SyncMarker>,
    pub stats: WalkStats,
    pub elapsed: Duration,
}

impl WalkReport {
    fn log_summary(&self, config: &DownloadConfig) {
        let s = &self.stats;
        if config.dry_run {
            tracing::info!("── Dry Run Summary ──");
            tracing::info!("  {} files would be downloaded", s.dry_run);
            tracing::info!("  {} already present", s.skipped);
            tracing::info!("  destination: {}", config.directory.display());
            return;
        }

        tracing::info!("── Summary ──");
        match self.state {
            WalkState::Completed => tracing::info!("  walked the full listing"),
            WalkState::ReachedMarker => tracing::info!("  stopped at previously synced item"),
            WalkState::Aborted => tracing::warn!("  aborted after {} page(s)", s.pages),
        }
        tracing::info!(
            "  {} items: {} downloaded, {} duplicates, {} skipped, {} failed, {} pages",
            s.items(),
            s.downloaded,
            s.duplicates,
            s.skipped,
            s.failed,
            s.pages
        );
        tracing::info!("  elapsed: {}", format_duration(self.elapsed));
    }
}

/// Drives the pagination walk and processes every item in listing order.
pub struct PageWalker<'a> {
    library: &'a MediaLibrary,
    markers: &'a MarkerStore,
    config: &'a DownloadConfig,
}

impl<'a> PageWalker<'a> {
    pub fn new(
        library: &'a MediaLibrary,
        markers: &'a MarkerStore,
        config: &'a DownloadConfig,
    ) -> Self {
        Self {
            library,
            markers,
            config,
        }
    }

    /// Run one walk starting from the first page.
    ///
    /// `previous` is the marker loaded before the walk. The first item of the
    /// first page is recorded as the new marker before anything else happens
    /// to it; when stopping is enabled, the walk ends at the item whose id
    /// equals `previous`.
    pub async fn run(&self, previous: Option<SyncMarker>) -> Result<WalkReport, SyncError> {
        let started = Instant::now();
        let pb = create_progress_bar(self.config.no_progress_bar);
        let mut stats = WalkStats::default();
        let mut marker = previous.clone();

        let walked = self
            .walk_pages(previous.as_ref(), &mut stats, &mut marker, &pb)
            .await;
        pb.finish_and_clear();

        // A walk that did not finish never covered the gap between the
        // previous marker and the point it stopped at, so the next walk must
        // not stop any earlier than this one was allowed to.
        let finished = matches!(
            walked,
            Ok(WalkState::Completed) | Ok(WalkState::ReachedMarker)
        );
        if !finished && marker != previous {
            if let (Some(recorded), false) = (&marker, self.config.dry_run) {
                tracing::warn!(
                    "Marker file {} now holds {}, but this sync did not finish; \
                     run the next sync with --full-scan to fetch the items it missed",
                    self.markers.path().display(),
                    recorded.newest_seen_id
                );
            }
            marker = previous;
        }

        let report = WalkReport {
            state: walked?,
            marker,
            stats,
            elapsed: started.elapsed(),
        };
        report.log_summary(self.config);
        Ok(report)
    }

    async fn walk_pages(
        &self,
        previous: Option<&SyncMarker>,
        stats: &mut WalkStats,
        marker: &mut Option<SyncMarker>,
        pb: &ProgressBar,
    ) -> Result<WalkState, SyncError> {
        let mut cursor: Option<String> = None;

        loop {
            let page = match self.library.fetch_page(cursor.as_deref()).await {
                Ok(page) => page,
                Err(e) => {
                    pb.suspend(|| {
                        tracing::error!(
                            "Library listing request failed (page token: {}): {}",
                            cursor.as_deref().unwrap_or("<first page>"),
                            e
                        )
                    });
                    return Ok(WalkState::Aborted);
                }
            };
            stats.pages += 1;

            for (index, item) in page.items.iter().enumerate() {
                if index == 0 && page.is_first_page_of_walk {
                    *marker = Some(self.record_marker(&item.id, pb)?);
                }

                if self.config.stop_at_marker
                    && previous.is_some_and(|m| m.newest_seen_id == item.id)
                {
                    pb.suspend(|| {
                        tracing::info!("Reached {} from the previous sync, stopping", item.id)
                    });
                    return Ok(WalkState::ReachedMarker);
                }

                pb.set_message(item.filename.clone());
                let outcome = self.process_item(item, pb).await?;
                stats.record(&outcome);
                pb.inc(1);
            }

            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => return Ok(WalkState::Completed),
            }
        }
    }

    fn record_marker(&self, id: &str, pb: &ProgressBar) -> Result<SyncMarker, SyncError> {
        if self.config.dry_run {
            pb.suspend(|| tracing::info!("[DRY RUN] Would mark {} as sync stop", id));
            return Ok(SyncMarker::new(id));
        }
        Ok(self.markers.record(id)?)
    }

    /// Bring one item to `<root>/<date folders>/<filename>`.
    ///
    /// An existing file at the target path counts as already synced without
    /// comparing content. Filesystem errors are returned; a failed download
    /// is logged and reported as [`ItemOutcome::Failed`].
    pub async fn process_item(
        &self,
        item: &MediaItem,
        pb: &ProgressBar,
    ) -> Result<ItemOutcome, SyncError> {
        let created_local = item.capture_time.with_timezone(&Local);
        let dir = paths::target_dir(
            &self.config.directory,
            &self.config.folder_structure,
            &created_local,
        );
        let target = dir.join(paths::clean_filename(&item.filename));

        if self.config.dry_run {
            if fs::try_exists(&target).await.map_err(SyncError::io(&target))? {
                return Ok(ItemOutcome::SkippedExisting);
            }
            pb.suspend(|| tracing::info!("[DRY RUN] Would download {}", target.display()));
            return Ok(ItemOutcome::DryRun);
        }

        fs::create_dir_all(&dir).await.map_err(SyncError::io(&dir))?;

        if fs::try_exists(&target).await.map_err(SyncError::io(&target))? {
            pb.suspend(|| {
                tracing::debug!("Skipping already downloaded file: {}", target.display())
            });
            return Ok(ItemOutcome::SkippedExisting);
        }

        let bytes = match file::fetch_item(self.library.session(), item).await {
            Ok(bytes) => bytes,
            Err(e) => {
                pb.suspend(|| tracing::error!("{}", e));
                return Ok(ItemOutcome::Failed);
            }
        };

        let outcome = dedup::write_safely(&target, &bytes)
            .await
            .map_err(SyncError::io(&target))?;

        match outcome {
            WriteOutcome::Written(path) => {
                let ts = item.capture_time.timestamp();
                let mtime_path = path.clone();
                match tokio::task::spawn_blocking(move || set_file_mtime(&mtime_path, ts)).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => pb.suspend(|| {
                        tracing::warn!("Could not set mtime on {}: {}", path.display(), e)
                    }),
                    Err(e) => pb.suspend(|| tracing::warn!("mtime task failed: {}", e)),
                }
                pb.suspend(|| tracing::info!("Downloaded {}", path.display()));
                Ok(ItemOutcome::Downloaded(path))
            }
            WriteOutcome::Duplicate { of } => {
                pb.suspend(|| {
                    tracing::debug!("{} is already stored as {}", item.filename, of.display())
                });
                Ok(ItemOutcome::Duplicate { of })
            }
        }
    }
}

/// Spinner showing how many items have been processed.
///
/// Returns `ProgressBar::hidden()` when the user passed `--no-progress-bar` or
/// stdout is not a TTY, so piped output and cron logs stay clean.
fn create_progress_bar(no_progress_bar: bool) -> ProgressBar {
    if no_progress_bar || !std::io::stdout().is_terminal() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner} [{elapsed_precise}] {pos} items {wide_msg}")
            .expect("valid template"),
    );
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

fn format_duration(d: Duration) -> String {
    let total_secs = d.as_secs();
    let hours = total_secs / 3600;
    let mins = (total_secs % 3600) / 60;
    let secs = total_secs % 60;

    if hours > 0 {
        format!("{}h {:02}m {:02}s", hours, mins, secs)
    } else if mins > 0 {
        format!("{}m {:02}s", mins, secs)
    } else {
        format!("{}s", secs)
    }
}

/// Set the modification and access times of a file to the given Unix
/// timestamp, clamping dates before 1970 to the epoch.
fn set_file_mtime(path: &Path, timestamp: i64) -> std::io::Result<()> {
    let time = if timestamp >= 0 {
        UNIX_EPOCH + Duration::from_secs(timestamp as u64)
    } else {
        UNIX_EPOCH
            .checked_sub(Duration::from_secs(timestamp.unsigned_abs()))
            .unwrap_or(SystemTime::UNIX_EPOCH)
    };
    let times = FileTimes::new().set_modified(time).set_accessed(time);
    let file = std::fs::File::options().write(true).open(path)?;
    file.set_times(times)?;
    Ok(())
}
