//! Remote media library. Pages through the Photos Library `mediaItems`
//! listing and exposes the authenticated session used for content retrieval.

pub mod error;
#[cfg(test)]
pub(crate) mod fake;
pub mod session;
pub mod types;

pub use error::ApiError;
pub use session::{BearerSession, LibrarySession};
pub use types::{MediaItem, Page};

use std::sync::Arc;

use tracing::debug;

use types::ListResponse;

/// Listing endpoint of the Photos Library API.
pub const LIST_ENDPOINT: &str = "https://photoslibrary.googleapis.com/v1/mediaItems";

/// Largest page the listing endpoint accepts.
pub const MAX_PAGE_SIZE: u32 = 100;

pub struct MediaLibrary {
    session: Arc<dyn LibrarySession>,
    endpoint: String,
    page_size: u32,
}

impl std::fmt::Debug for MediaLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaLibrary")
            .field("endpoint", &self.endpoint)
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}

impl MediaLibrary {
    pub fn new(session: Arc<dyn LibrarySession>, page_size: u32) -> Self {
        Self::with_endpoint(session, LIST_ENDPOINT, page_size)
    }

    pub fn with_endpoint(
        session: Arc<dyn LibrarySession>,
        endpoint: impl Into<String>,
        page_size: u32,
    ) -> Self {
        Self {
            session,
            endpoint: endpoint.into(),
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn session(&self) -> &dyn LibrarySession {
        self.session.as_ref()
    }

    /// Fetch one page of the listing. `None` starts a fresh walk.
    pub async fn fetch_page(&self, cursor: Option<&str>) -> Result<Page, ApiError> {
        let page_size = self.page_size.to_string();
        let mut query: Vec<(&str, &str)> = vec![("pageSize", page_size.as_str())];
        if let Some(token) = cursor {
            query.push(("pageToken", token));
        }

        let body = self.session.get_json(&self.endpoint, &query).await?;
        let response: ListResponse = serde_json::from_value(body)?;

        let items: Vec<MediaItem> = response
            .media_items
            .unwrap_or_default()
            .into_iter()
            .map(MediaItem::from)
            .collect();
        debug!(
            "Fetched page with {} items (cursor: {:?}, more: {})",
            items.len(),
            cursor,
            response.next_page_token.is_some()
        );

        Ok(Page {
            items,
            next_cursor: response.next_page_token.filter(|t| !t.is_empty()),
            is_first_page_of_walk: cursor.is_none(),
        })
    }
}
