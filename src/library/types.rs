use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

/// One entry of the remote listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaItem {
    pub id: String,
    pub filename: String,
    pub base_url: String,
    pub capture_time: DateTime<Utc>,
    pub is_video: bool,
}

/// One page of the remote listing, in the order the server returned it.
#[derive(Debug, Clone)]
pub struct Page {
    pub items: Vec<MediaItem>,
    pub next_cursor: Option<String>,
    /// True only for the page requested without a cursor.
    pub is_first_page_of_walk: bool,
}

/// `mediaItems.list` response body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListResponse {
    /// Omitted by the API when the library (or the remaining listing) is empty.
    #[serde(default)]
    pub media_items: Option<Vec<RawMediaItem>>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawMediaItem {
    pub id: String,
    pub filename: String,
    pub base_url: String,
    pub media_metadata: MediaMetadata,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MediaMetadata {
    /// RFC 3339 timestamp of when the photo or video was taken.
    pub creation_time: DateTime<Utc>,
    /// Present (possibly as an empty object) only for videos.
    #[serde(default)]
    pub video: Option<Value>,
}

impl From<RawMediaItem> for MediaItem {
    fn from(raw: RawMediaItem) -> Self {
        Self {
            id: raw.id,
            filename: raw.filename,
            base_url: raw.base_url,
            capture_time: raw.media_metadata.creation_time,
            is_video: raw.media_metadata.video.is_some(),
        }
    }
}
