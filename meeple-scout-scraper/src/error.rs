use thiserror::Error;

/// Errors from the catalog scraping layer.
#[derive(Error, Debug)]
pub enum ScrapeError {
    /// Network-level failure (timeout, connection reset, DNS).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The upstream answered with a retryable status (5xx or 429).
    #[error("Server error (HTTP {status})")]
    Server { status: u16 },

    /// The page does not exist (HTTP 404). Recorded in the page cache as a
    /// negative result so later runs skip the request.
    #[error("Page not found")]
    NotFound,

    /// The given URL is not a recognizable boardgame URL.
    #[error("Not a BGG boardgame URL: {0}")]
    InvalidUrl(String),

    /// Page cache bookkeeping failure.
    #[error("Cache error: {0}")]
    Cache(String),

    /// A progress checkpoint could not be written. Fatal to the batch.
    #[error("Checkpoint write failed: {0}")]
    Checkpoint(#[source] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScrapeError {
    pub fn cache(msg: impl Into<String>) -> Self {
        Self::Cache(msg.into())
    }
}
