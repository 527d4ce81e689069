use clap::Parser;

use crate::types::LogLevel;

#[derive(Parser, Debug)]
#[command(
    name = "gphotos-sync",
    about = "Download a Google Photos library into dated folders"
)]
pub struct Cli {
    /// Local directory for downloads
    #[arg(short = 'd', long)]
    pub directory: String,

    /// OAuth access token with the photoslibrary.readonly scope.
    /// WARNING: passing via --access-token is visible in process listings.
    /// Prefer the GPHOTOS_ACCESS_TOKEN environment variable instead.
    #[arg(long, env = "GPHOTOS_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: String,

    /// File holding the id of the newest item seen by the last sync
    /// (default: <directory>/sync-stop.txt)
    #[arg(long)]
    pub marker_file: Option<String>,

    /// Folder structure for organizing downloads (%Y, %m, %d, or "none")
    #[arg(long, default_value = "%Y/%m")]
    pub folder_structure: String,

    /// Items requested per listing page (1-100)
    #[arg(long, default_value_t = 100)]
    pub page_size: u32,

    /// Walk the whole library instead of stopping at the last synced item
    #[arg(long)]
    pub full_scan: bool,

    /// Do not modify the local system
    #[arg(long)]
    pub dry_run: bool,

    /// Run continuously, waiting N seconds between runs
    #[arg(long)]
    pub watch_with_interval: Option<u64>,

    /// Log level
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    /// Disable progress bar
    #[arg(long)]
    pub no_progress_bar: bool,
}
