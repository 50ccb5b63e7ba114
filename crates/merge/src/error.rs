use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading, merging or saving record files
#[derive(Error, Debug)]
pub enum MergeError {
    /// The document does not have the shape the sub-path or merge expects.
    #[error("{0}")]
    Parser(String),

    #[error("The provided path '{}' does not exist!", .0.display())]
    MissingPath(PathBuf),

    #[error("Unknown data type '{0}'. Expected csv or json")]
    UnknownKind(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MergeError {
    pub fn parser(message: impl Into<String>) -> Self {
        Self::Parser(message.into())
    }
}

pub type Result<T> = std::result::Result<T, MergeError>;
