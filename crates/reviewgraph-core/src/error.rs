//! Error types for ReviewGraph.
//!
//! Variants are grouped the way callers need to tell them apart: bad input
//! at load time, extractor failures (recovered inside a batch), query
//! statuses, and export failures.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Dataset is empty: {0}")]
    EmptyDataset(String),

    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Search index not built")]
    NotReady,

    #[error("Empty query")]
    EmptyQuery,

    #[error("Export error: {0}")]
    Export(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True for errors caused by the dataset itself rather than the system.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Error::EmptyDataset(_) | Error::MissingColumn(_) | Error::InvalidInput(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
