use super::error::DownloadError;
use crate::library::{LibrarySession, MediaItem};

/// `baseUrl` suffix for the original video stream.
const VIDEO_SUFFIX: &str = "=dv";
/// `baseUrl` suffix for the full-resolution photo with metadata.
const PHOTO_SUFFIX: &str = "=d";

/// Retrieval URL for an item's full-resolution content.
pub fn content_url(item: &MediaItem) -> String {
    let suffix = if item.is_video {
        VIDEO_SUFFIX
    } else {
        PHOTO_SUFFIX
    };
    format!("{}{}", item.base_url, suffix)
}

/// Fetch an item's bytes with a single authenticated GET.
///
/// The body is buffered in full so that a failed transfer never leaves a
/// partial file behind.
pub async fn fetch_item(
    session: &dyn LibrarySession,
    item: &MediaItem,
) -> Result<Vec<u8>, DownloadError> {
    let url = content_url(item);
    session
        .get_bytes(&url)
        .await
        .map_err(|source| DownloadError {
            filename: item.filename.clone(),
            source,
        })
}
