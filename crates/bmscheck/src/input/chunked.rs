//! Disk-backed dataset that re-reads its file one window at a time.

use std::fs::File;
use std::io::BufReader;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{BmsCheckError, Result};

use super::loader::{csv_reader, decode_record};
use super::source::{Dataset, LoadStrategy, RowWindow};

/// Dataset whose rows stay on disk.
///
/// Structure (field counts, row count, headers) is verified once at load
/// time; each scan streams the file again and never holds more than one
/// window of rows.
#[derive(Debug)]
pub struct ChunkedDataset {
    path: PathBuf,
    delimiter: u8,
    headers: Vec<String>,
    row_count: usize,
    window_rows: usize,
    /// Keeps a spooled stream alive for as long as the dataset.
    _spool: Option<NamedTempFile>,
}

impl ChunkedDataset {
    pub(crate) fn new(
        path: PathBuf,
        delimiter: u8,
        headers: Vec<String>,
        row_count: usize,
        window_rows: usize,
        spool: Option<NamedTempFile>,
    ) -> Self {
        Self {
            path,
            delimiter,
            headers,
            row_count,
            window_rows: window_rows.max(1),
            _spool: spool,
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self) -> Result<csv::Reader<BufReader<File>>> {
        let file = File::open(&self.path).map_err(|e| BmsCheckError::Io {
            path: self.path.clone(),
            source: e,
        })?;
        Ok(csv_reader(self.delimiter).from_reader(BufReader::new(file)))
    }
}

impl Dataset for ChunkedDataset {
    fn headers(&self) -> &[String] {
        &self.headers
    }

    fn row_count(&self) -> usize {
        self.row_count
    }

    fn strategy(&self) -> LoadStrategy {
        LoadStrategy::Chunked
    }

    fn window_rows(&self) -> usize {
        self.window_rows
    }

    fn scan(
        &self,
        visit: &mut dyn FnMut(RowWindow<'_>) -> Result<ControlFlow<()>>,
    ) -> Result<()> {
        let mut reader = self.open()?;
        let mut record = csv::ByteRecord::new();
        let mut buffer: Vec<Vec<String>> = Vec::with_capacity(self.window_rows);
        let mut start_row = 0;

        loop {
            let more = reader
                .read_byte_record(&mut record)
                .map_err(|e| BmsCheckError::from_csv(e, Some(&self.path)))?;
            if more {
                buffer.push(decode_record(&record));
            }

            let full = buffer.len() >= self.window_rows;
            if full || (!more && !buffer.is_empty()) {
                let window = RowWindow {
                    start_row,
                    rows: &buffer,
                };
                if visit(window)?.is_break() {
                    return Ok(());
                }
                start_row += buffer.len();
                buffer.clear();
            }

            if !more {
                break;
            }
        }

        if start_row != self.row_count {
            return Err(BmsCheckError::CorruptFile {
                row: Some(start_row),
                message: format!(
                    "file changed during validation: expected {} rows, read {}",
                    self.row_count, start_row
                ),
            });
        }

        Ok(())
    }
}
