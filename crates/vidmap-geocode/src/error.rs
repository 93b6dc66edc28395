use thiserror::Error;
use vidmap_core::FeatureKind;

/// Errors returned by the geocoding client.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a non-2xx status.
    #[error("unexpected HTTP status {status} from geocoding provider")]
    UnexpectedStatus { status: u16 },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The configured base URL cannot carry path segments.
    #[error("invalid geocoding base URL: {0}")]
    InvalidBaseUrl(String),

    /// The provider returned no features for a text query.
    #[error("no place found for {query:?}")]
    NotFound { query: String },

    /// The top match is not a place we search videos for (water bodies,
    /// unnamed roads, points of interest, empty names).
    #[error("unsupported place {name:?} (kind: {kind})")]
    InvalidFeatureKind { kind: FeatureKind, name: String },

    /// A feature carried an unusable center coordinate.
    #[error("invalid feature in provider response: {0}")]
    InvalidResponse(String),
}
