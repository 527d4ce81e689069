//! Marker file load/record.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use super::error::MarkerError;

/// Id of the newest item observed by the last fresh walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncMarker {
    pub newest_seen_id: String,
}

impl SyncMarker {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            newest_seen_id: id.into(),
        }
    }
}

/// Reads and writes the marker file. The file holds the raw id and nothing
/// else; every write replaces it wholesale.
#[derive(Debug, Clone)]
pub struct MarkerStore {
    path: PathBuf,
}

impl MarkerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the marker. A missing or empty file means no prior walk.
    pub fn load(&self) -> Result<Option<SyncMarker>, MarkerError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!(
                    "No marker file at {}, walking the full library",
                    self.path.display()
                );
                return Ok(None);
            }
            Err(source) => {
                return Err(MarkerError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let id = contents.trim();
        if id.is_empty() {
            tracing::warn!("Marker file {} is empty, ignoring", self.path.display());
            return Ok(None);
        }
        tracing::debug!("Loaded marker {} from {}", id, self.path.display());
        Ok(Some(SyncMarker::new(id)))
    }

    /// Persist `id` as the new marker. Returns only after the bytes have been
    /// flushed to disk.
    pub fn record(&self, id: &str) -> Result<SyncMarker, MarkerError> {
        let write = || -> std::io::Result<()> {
            if let Some(parent) = self.path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            let mut file = std::fs::File::create(&self.path)?;
            file.write_all(id.as_bytes())?;
            file.sync_all()
        };
        write().map_err(|source| MarkerError::Write {
            path: self.path.clone(),
            source,
        })?;

        tracing::info!("{} marked as sync stop", id);
        Ok(SyncMarker::new(id))
    }
}
