use thiserror::Error;

/// Errors returned by the remote library API.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP {status} from {url}: {body}")]
    Status {
        status: u16,
        url: String,
        body: String,
    },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("Malformed response: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display_includes_code_and_url() {
        let e = ApiError::Status {
            status: 401,
            url: "https://example.com/v1/mediaItems".into(),
            body: "Request had invalid authentication credentials".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("401"));
        assert!(msg.contains("/v1/mediaItems"));
    }

    #[test]
    fn test_json_error_from() {
        let err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let e: ApiError = err.into();
        assert!(e.to_string().starts_with("Malformed response"));
    }
}
