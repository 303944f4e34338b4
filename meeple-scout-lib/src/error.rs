use std::path::PathBuf;
use thiserror::Error;

/// Errors from reading the collection export.
#[derive(Error, Debug)]
pub enum CollectionError {
    /// The collection CSV does not exist at the given path.
    #[error("Collection file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The CSV could not be parsed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
