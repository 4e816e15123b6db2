/// Custom error type for the fury library
///
/// Using `thiserror` for automatic `Error` trait implementation and `From`
/// conversions. Per-bookmark failures during an import are caught and
/// counted by the pipeline; only the variants documented as terminal abort
/// a run.
#[derive(Debug, thiserror::Error)]
pub enum FuryError {
    /// Database-related errors (SQLite)
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// I/O errors (file operations, network)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request errors
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Unrecognized archive structure; terminal, raised before any writes
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// URL fails validation or reachability probes; per-bookmark, counted as skipped
    #[error("Invalid URL: {0}")]
    InvalidTarget(String),

    /// Network or parse failure after validation; enrichment is omitted
    #[error("Fetch failed: {0}")]
    FetchFailed(String),

    /// Missing key, transport error, non-OK status, empty candidate or
    /// unparseable JSON; triggers the deterministic fallback path
    #[error("LLM unavailable: {0}")]
    LlmUnavailable(String),

    /// LLM JSON array closed early; tolerated by trimming to the last complete pair
    #[error("LLM response truncated")]
    LlmTruncated,

    /// Unique-key clash during insert; resolved by re-reading and updating
    #[error("Storage conflict: {0}")]
    StorageConflict(String),

    /// Terminal; aborts the run with a terminal error event
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Cooperative abort; terminal after the partial session record is written
    #[error("cancelled")]
    Cancelled,

    /// Invalid input or arguments
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTML parsing errors
    #[error("HTML parse error: {0}")]
    HtmlParse(String),

    /// JSON errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Generic error for cases that don't fit other categories
    #[error("{0}")]
    Other(String),
}

/// Result type alias using FuryError
pub type Result<T> = std::result::Result<T, FuryError>;

impl From<String> for FuryError {
    fn from(s: String) -> Self {
        FuryError::Other(s)
    }
}

impl From<&str> for FuryError {
    fn from(s: &str) -> Self {
        FuryError::Other(s.to_string())
    }
}

impl From<serde_yaml::Error> for FuryError {
    fn from(err: serde_yaml::Error) -> Self {
        FuryError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for FuryError {
    fn from(err: serde_json::Error) -> Self {
        FuryError::Json(err.to_string())
    }
}

impl From<simd_json::Error> for FuryError {
    fn from(err: simd_json::Error) -> Self {
        FuryError::Json(err.to_string())
    }
}

impl From<tl::ParseError> for FuryError {
    fn from(err: tl::ParseError) -> Self {
        FuryError::HtmlParse(err.to_string())
    }
}
