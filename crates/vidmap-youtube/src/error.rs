use thiserror::Error;

/// Errors returned by the video platform client.
#[derive(Debug, Error)]
pub enum VideoError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The platform rejected the key or the daily quota is spent (401, 403,
    /// 429). Never retried.
    #[error("video platform quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Any other non-2xx status.
    #[error("unexpected HTTP status {status} from video platform")]
    UnexpectedStatus { status: u16 },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The configured base URL cannot carry path segments.
    #[error("invalid video platform base URL: {0}")]
    InvalidBaseUrl(String),
}
