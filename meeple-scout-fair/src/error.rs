use thiserror::Error;

/// Errors from fetching fair data or producing reports.
#[derive(Debug, Error)]
pub enum FairError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Fair data unavailable: {0}")]
    Unavailable(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FairError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    pub fn cache(msg: impl Into<String>) -> Self {
        Self::Cache(msg.into())
    }
}
