//! Data source abstraction and metadata.

use std::ops::ControlFlow;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Default number of rows per scan window.
pub const DEFAULT_WINDOW_ROWS: usize = 10_000;

/// Metadata about the source data file.
///
/// Carries no wall-clock timestamps so repeated runs serialize identically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// File name without path.
    pub file: String,
    /// Full path to the file, when loaded from disk.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// SHA-256 hash of the file contents.
    pub hash: String,
    /// File size in bytes.
    pub size_bytes: u64,
    /// Detected format (csv, tsv, etc.).
    pub format: String,
    /// Number of data rows (excluding header).
    pub row_count: usize,
    /// Number of columns.
    pub column_count: usize,
}

impl SourceMetadata {
    /// Create metadata for a loaded file.
    pub fn new(
        path: Option<PathBuf>,
        file: impl Into<String>,
        hash: String,
        size_bytes: u64,
        format: String,
        row_count: usize,
        column_count: usize,
    ) -> Self {
        Self {
            file: file.into(),
            path,
            hash,
            size_bytes,
            format,
            row_count,
            column_count,
        }
    }

    /// Metadata for a dataset built in memory rather than read from a file.
    pub fn in_memory(dataset: &dyn Dataset) -> Self {
        Self::new(
            None,
            "<memory>",
            String::new(),
            0,
            "memory".to_string(),
            dataset.row_count(),
            dataset.column_count(),
        )
    }
}

/// How a dataset is held during validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadStrategy {
    /// All rows materialized in memory.
    InMemory,
    /// Rows re-read from disk one window at a time.
    Chunked,
}

impl LoadStrategy {
    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            LoadStrategy::InMemory => "in-memory",
            LoadStrategy::Chunked => "chunked",
        }
    }
}

impl std::fmt::Display for LoadStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A contiguous block of rows visited during a scan.
#[derive(Debug, Clone, Copy)]
pub struct RowWindow<'a> {
    /// Data row index of the first row in the window.
    pub start_row: usize,
    /// The rows, each a vector of raw cells.
    pub rows: &'a [Vec<String>],
}

impl<'a> RowWindow<'a> {
    /// Number of rows in the window.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check whether the window holds no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Get a cell by window-relative row and column; absent cells read as "".
    pub fn cell(&self, row: usize, col: usize) -> &'a str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(|s| s.as_str())
            .unwrap_or("")
    }

    /// Iterate `(data_row_index, cell)` for one column.
    pub fn column(&self, col: usize) -> impl Iterator<Item = (usize, &'a str)> + 'a {
        let start = self.start_row;
        self.rows.iter().enumerate().map(move |(i, row)| {
            (
                start + i,
                row.get(col).map(|s| s.as_str()).unwrap_or(""),
            )
        })
    }
}

/// Read capability shared by every dataset backend.
///
/// Detectors only ever see a dataset through this trait: a sequential scan
/// over ordered row windows. The in-memory and chunked backends must present
/// identical headers, rows and window boundaries.
pub trait Dataset: Send + Sync {
    /// Column headers.
    fn headers(&self) -> &[String];

    /// Number of data rows (excluding header).
    fn row_count(&self) -> usize;

    /// How the rows are held.
    fn strategy(&self) -> LoadStrategy;

    /// Rows per scan window.
    fn window_rows(&self) -> usize;

    /// Visit every row window in order until the visitor breaks.
    fn scan(
        &self,
        visit: &mut dyn FnMut(RowWindow<'_>) -> Result<ControlFlow<()>>,
    ) -> Result<()>;

    /// Number of columns.
    fn column_count(&self) -> usize {
        self.headers().len()
    }

    /// Collect the first `n` rows.
    fn head(&self, n: usize) -> Result<Vec<Vec<String>>> {
        let mut rows = Vec::with_capacity(n.min(self.row_count()));
        if n == 0 {
            return Ok(rows);
        }
        self.scan(&mut |window| {
            for row in window.rows {
                rows.push(row.clone());
                if rows.len() >= n {
                    return Ok(ControlFlow::Break(()));
                }
            }
            Ok(ControlFlow::Continue(()))
        })?;
        Ok(rows)
    }
}

/// Dataset with every row materialized.
#[derive(Debug, Clone)]
pub struct InMemoryDataset {
    /// Column headers.
    pub headers: Vec<String>,
    /// Row data as strings (row-major order).
    pub rows: Vec<Vec<String>>,
    window_rows: usize,
}

impl InMemoryDataset {
    /// Create a new in-memory dataset.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            headers,
            rows,
            window_rows: DEFAULT_WINDOW_ROWS,
        }
    }

    /// Set the scan window size.
    pub fn with_window_rows(mut self, window_rows: usize) -> Self {
        self.window_rows = window_rows.max(1);
        self
    }

    /// Build from string slices, mostly for tests and embedding callers.
    pub fn from_rows(headers: &[&str], rows: &[Vec<&str>]) -> Self {
        Self::new(
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    /// Get a specific cell value.
    pub fn get(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row).and_then(|r| r.get(col).map(|s| s.as_str()))
    }
}

impl Dataset for InMemoryDataset {
    fn headers(&self) -> &[String] {
        &self.headers
    }

    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn strategy(&self) -> LoadStrategy {
        LoadStrategy::InMemory
    }

    fn window_rows(&self) -> usize {
        self.window_rows
    }

    fn scan(
        &self,
        visit: &mut dyn FnMut(RowWindow<'_>) -> Result<ControlFlow<()>>,
    ) -> Result<()> {
        for (i, chunk) in self.rows.chunks(self.window_rows).enumerate() {
            let window = RowWindow {
                start_row: i * self.window_rows,
                rows: chunk,
            };
            if visit(window)?.is_break() {
                break;
            }
        }
        Ok(())
    }
}
