//! Error types for the state module.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reading or writing the marker file.
#[derive(Error, Debug)]
pub enum MarkerError {
    /// The marker file exists but could not be read.
    #[error("Failed to read marker file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The marker could not be written durably.
    #[error("Failed to write marker file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}
