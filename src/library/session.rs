use serde_json::Value;

use super::error::ApiError;

/// Authenticated request capability used by the sync engine.
///
/// How the credentials are obtained is not this trait's concern; an
/// implementation only has to attach them to each request.
#[async_trait::async_trait]
pub trait LibrarySession: Send + Sync {
    /// GET `url` with the given query parameters and decode a JSON body.
    async fn get_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Value, ApiError>;

    /// GET `url` and return the raw response body.
    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, ApiError>;
}

/// Session that sends a fixed OAuth bearer token with every request.
#[derive(Clone)]
pub struct BearerSession {
    client: reqwest::Client,
    access_token: String,
}

impl std::fmt::Debug for BearerSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerSession")
            .field("access_token", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl BearerSession {
    pub fn new(client: reqwest::Client, access_token: impl Into<String>) -> Self {
        Self {
            client,
            access_token: access_token.into(),
        }
    }

    async fn send(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<reqwest::Response, ApiError> {
        let response = self
            .client
            .get(url)
            .query(query)
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            // Keep only a prefix of the body; error pages can be large HTML.
            let body: String = response
                .text()
                .await
                .unwrap_or_default()
                .chars()
                .take(512)
                .collect();
            return Err(ApiError::Status {
                status: status.as_u16(),
                url: url.to_string(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait::async_trait]
impl LibrarySession for BearerSession {
    async fn get_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Value, ApiError> {
        let response = self.send(url, query).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        let response = self.send(url, &[]).await?;
        Ok(response.bytes().await?.to_vec())
    }
}
