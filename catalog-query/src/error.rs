//! Error types for parsing and fetching catalog service queries.

/// Malformed query text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("catalog.service: invalid format: empty query")]
    Empty,

    #[error("catalog.service: invalid format: {input:?}: missing value after {separator:?}")]
    MissingOperand { input: String, separator: char },

    #[error("catalog.service: invalid format: {input:?}: unsupported option {key:?}")]
    UnsupportedOption { input: String, key: String },

    #[error("catalog.service: invalid format: {input:?}: option {key:?} given more than once")]
    DuplicateOption { input: String, key: String },

    #[error("catalog.service: invalid format: {input:?}: name required")]
    NameRequired { input: String },
}

/// Failure reported by a catalog client implementation.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected response {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode catalog response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid catalog URL: {0}")]
    Url(String),

    #[error("request cancelled")]
    Cancelled,
}

/// Failure of a single fetch, tagged with the canonical form of the query.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("{query}: {source}")]
    Catalog {
        query: String,
        #[source]
        source: ClientError,
    },

    #[error("{query}: cancelled")]
    Cancelled { query: String },
}

impl FetchError {
    /// True when the fetch was aborted through the query's cancellation signal
    pub fn is_cancelled(&self) -> bool {
        matches!(self, FetchError::Cancelled { .. })
    }
}
