//! Error types for the STAC data sources.

use glofscan_core::source::SourceError;
use thiserror::Error;

/// Errors produced while talking to a STAC API or reading its assets.
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned HTTP {status}: {body}")]
    Status { url: String, status: u16, body: String },

    #[error("invalid STAC response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("authentication error: {0}")]
    Auth(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("item {item} has no asset '{asset}'")]
    MissingAsset { item: String, asset: String },

    #[error("core error: {0}")]
    Core(#[from] glofscan_core::Error),
}

impl CloudError {
    /// Timeouts, dropped connections, rate limiting and server errors
    pub fn is_transient(&self) -> bool {
        match self {
            CloudError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            CloudError::Status { status, .. } => *status == 429 || *status >= 500,
            CloudError::Network(_) => true,
            _ => false,
        }
    }
}

impl From<CloudError> for SourceError {
    fn from(e: CloudError) -> Self {
        match e {
            CloudError::Core(glofscan_core::Error::Source(inner)) => inner,
            CloudError::Status { status: 404, .. } => SourceError::Unavailable(e.to_string()),
            e if e.is_transient() => SourceError::Transient(e.to_string()),
            e => SourceError::Failed(e.to_string()),
        }
    }
}

/// Result alias for cloud operations.
pub type Result<T> = std::result::Result<T, CloudError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16) -> CloudError {
        CloudError::Status {
            url: "https://example.com/search".into(),
            status: code,
            body: String::new(),
        }
    }

    #[test]
    fn status_classification() {
        assert!(matches!(SourceError::from(status(429)), SourceError::Transient(_)));
        assert!(matches!(SourceError::from(status(503)), SourceError::Transient(_)));
        assert!(matches!(SourceError::from(status(404)), SourceError::Unavailable(_)));
        assert!(matches!(SourceError::from(status(403)), SourceError::Failed(_)));
    }

    #[test]
    fn missing_asset_is_permanent() {
        let e = CloudError::MissingAsset {
            item: "LC08".into(),
            asset: "green".into(),
        };
        assert!(!e.is_transient());
        assert!(matches!(SourceError::from(e), SourceError::Failed(_)));
    }
}
