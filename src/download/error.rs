use std::path::PathBuf;

use thiserror::Error;

use crate::library::ApiError;
use crate::state::MarkerError;

/// A single item's content could not be fetched. Never fatal to a walk.
#[derive(Debug, Error)]
#[error("Failed to download {filename}: {source}")]
pub struct DownloadError {
    pub filename: String,
    #[source]
    pub source: ApiError,
}

/// Errors that end a walk. Page fetch failures are not among them: those
/// are reported as an aborted walk instead.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Filesystem error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Marker(#[from] MarkerError),
}

impl SyncError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| SyncError::Io { path, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_error_names_file() {
        let e = DownloadError {
            filename: "IMG_0001.JPG".into(),
            source: ApiError::Status {
                status: 404,
                url: "https://media.example/x=d".into(),
                body: String::new(),
            },
        };
        let msg = e.to_string();
        assert!(msg.contains("IMG_0001.JPG"));
        assert!(msg.contains("404"));
    }

    #[test]
    fn test_io_helper_keeps_path() {
        let err = SyncError::io("/photos/2023/03")(std::io::Error::other("disk full"));
        match err {
            SyncError::Io { path, .. } => assert_eq!(path, PathBuf::from("/photos/2023/03")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
