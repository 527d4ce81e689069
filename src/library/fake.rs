//! In-memory `LibrarySession` for exercising the engine without a network.

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::Value;

use super::error::ApiError;
use super::session::LibrarySession;

#[derive(Default)]
pub(crate) struct FakeSession {
    pages: Mutex<HashMap<Option<String>, Result<Value, u16>>>,
    blobs: Mutex<HashMap<String, Result<Vec<u8>, u16>>>,
    listing_requests: Mutex<Vec<(Option<String>, String)>>,
    byte_requests: Mutex<Vec<String>>,
}

impl FakeSession {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add_page(&self, cursor: Option<&str>, body: Value) {
        self.pages
            .lock()
            .unwrap()
            .insert(cursor.map(str::to_string), Ok(body));
    }

    pub(crate) fn fail_page(&self, cursor: Option<&str>, status: u16) {
        self.pages
            .lock()
            .unwrap()
            .insert(cursor.map(str::to_string), Err(status));
    }

    pub(crate) fn add_blob(&self, url: &str, bytes: &[u8]) {
        self.blobs
            .lock()
            .unwrap()
            .insert(url.to_string(), Ok(bytes.to_vec()));
    }

    pub(crate) fn fail_blob(&self, url: &str, status: u16) {
        self.blobs
            .lock()
            .unwrap()
            .insert(url.to_string(), Err(status));
    }

    /// `(pageToken, pageSize)` of every listing request, in order.
    pub(crate) fn listing_requests(&self) -> Vec<(Option<String>, String)> {
        self.listing_requests.lock().unwrap().clone()
    }

    /// URL of every content request, in order.
    pub(crate) fn byte_requests(&self) -> Vec<String> {
        self.byte_requests.lock().unwrap().clone()
    }
}

fn status_error(status: u16, url: &str) -> ApiError {
    ApiError::Status {
        status,
        url: url.to_string(),
        body: String::new(),
    }
}

#[async_trait::async_trait]
impl LibrarySession for FakeSession {
    async fn get_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Value, ApiError> {
        let lookup = |key: &str| {
            query
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        };
        let cursor = lookup("pageToken");
        self.listing_requests
            .lock()
            .unwrap()
            .push((cursor.clone(), lookup("pageSize").unwrap_or_default()));

        match self.pages.lock().unwrap().get(&cursor) {
            Some(Ok(body)) => Ok(body.clone()),
            Some(Err(status)) => Err(status_error(*status, url)),
            None => Err(status_error(404, url)),
        }
    }

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        self.byte_requests.lock().unwrap().push(url.to_string());
        match self.blobs.lock().unwrap().get(url) {
            Some(Ok(bytes)) => Ok(bytes.clone()),
            Some(Err(status)) => Err(status_error(*status, url)),
            None => Err(status_error(404, url)),
        }
    }
}
