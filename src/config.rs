use std::path::PathBuf;

use crate::download::paths;
use crate::download::DownloadConfig;
use crate::library::MAX_PAGE_SIZE;

/// Marker file name used when `--marker-file` is not given.
const DEFAULT_MARKER_FILE: &str = "sync-stop.txt";

/// Application configuration.
pub struct Config {
    pub access_token: String,
    pub directory: PathBuf,
    pub marker_file: PathBuf,
    pub folder_structure: String,
    pub watch_with_interval: Option<u64>,
    pub page_size: u32,
    pub full_scan: bool,
    pub dry_run: bool,
    pub no_progress_bar: bool,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("access_token", &"<redacted>")
            .field("directory", &self.directory)
            .field("marker_file", &self.marker_file)
            .field("folder_structure", &self.folder_structure)
            .field("page_size", &self.page_size)
            .field("full_scan", &self.full_scan)
            .field("dry_run", &self.dry_run)
            .finish_non_exhaustive()
    }
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

impl Config {
    pub fn from_cli(cli: crate::cli::Cli) -> anyhow::Result<Self> {
        if cli.directory.trim().is_empty() {
            anyhow::bail!("--directory must not be empty");
        }
        if cli.access_token.trim().is_empty() {
            anyhow::bail!("An access token is required (--access-token or GPHOTOS_ACCESS_TOKEN)");
        }
        if cli.page_size == 0 || cli.page_size > MAX_PAGE_SIZE {
            anyhow::bail!(
                "--page-size must be between 1 and {}, got {}",
                MAX_PAGE_SIZE,
                cli.page_size
            );
        }
        paths::validate_folder_structure(&cli.folder_structure).map_err(|reason| {
            anyhow::anyhow!("Invalid --folder-structure '{}': {}", cli.folder_structure, reason)
        })?;

        let directory = expand_tilde(&cli.directory);
        let marker_file = cli
            .marker_file
            .as_deref()
            .map(expand_tilde)
            .unwrap_or_else(|| directory.join(DEFAULT_MARKER_FILE));

        Ok(Self {
            access_token: cli.access_token,
            directory,
            marker_file,
            folder_structure: cli.folder_structure,
            watch_with_interval: cli.watch_with_interval,
            page_size: cli.page_size,
            full_scan: cli.full_scan,
            dry_run: cli.dry_run,
            no_progress_bar: cli.no_progress_bar,
        })
    }

    pub fn download_config(&self) -> DownloadConfig {
        DownloadConfig {
            directory: self.directory.clone(),
            folder_structure: self.folder_structure.clone(),
            stop_at_marker: !self.full_scan,
            dry_run: self.dry_run,
            no_progress_bar: self.no_progress_bar,
        }
    }
}
