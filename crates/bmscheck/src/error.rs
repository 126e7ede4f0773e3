//! Error types for the bmscheck library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for bmscheck operations.
///
/// Only input, configuration, cancellation and persistence failures are
/// represented here. Detector edge cases never surface as errors: a file that
/// loads always produces a [`ValidationResult`](crate::ValidationResult).
#[derive(Debug, Error)]
pub enum BmsCheckError {
    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File format not supported.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Structural parsing failed (inconsistent field counts, broken quoting).
    #[error("Corrupt file{}: {message}", row_suffix(.row))]
    CorruptFile { row: Option<usize>, message: String },

    /// No header or no data rows.
    #[error("Empty file: {0}")]
    EmptyFile(String),

    /// Invalid configuration, detected before any data is loaded.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The caller's cancellation token fired during a run.
    #[error("Validation cancelled")]
    Cancelled,

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Regex compilation error.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// Error saving or loading a result file.
    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl BmsCheckError {
    /// Map a CSV reader error onto the loader's error taxonomy.
    pub(crate) fn from_csv(err: csv::Error, path: Option<&std::path::Path>) -> Self {
        let row = err
            .position()
            .map(|p| p.record().saturating_sub(1) as usize);

        match err.into_kind() {
            csv::ErrorKind::Io(source) => BmsCheckError::Io {
                path: path.map(|p| p.to_path_buf()).unwrap_or_default(),
                source,
            },
            csv::ErrorKind::UnequalLengths {
                expected_len, len, ..
            } => BmsCheckError::CorruptFile {
                row,
                message: format!("expected {} fields, found {}", expected_len, len),
            },
            other => BmsCheckError::CorruptFile {
                row,
                message: format!("{:?}", other),
            },
        }
    }
}

fn row_suffix(row: &Option<usize>) -> String {
    row.map(|r| format!(" at data row {}", r)).unwrap_or_default()
}

/// Result type alias for bmscheck operations.
pub type Result<T> = std::result::Result<T, BmsCheckError>;
