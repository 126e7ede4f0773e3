//! Loads delimited exports into a [`Dataset`], choosing the strategy by size.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::config::ResolvedConfig;
use crate::error::{BmsCheckError, Result};

use super::chunked::ChunkedDataset;
use super::source::{DEFAULT_WINDOW_ROWS, Dataset, InMemoryDataset, SourceMetadata};

/// Delimiters to try when auto-detecting.
const DELIMITERS: &[u8] = &[b'\t', b',', b';', b'|'];

/// Bytes inspected for delimiter detection on the chunked path.
const SNIFF_BYTES: u64 = 64 * 1024;

/// Extensions and media types accepted as delimited text.
const TEXT_EXTENSIONS: &[&str] = &["csv", "tsv", "tab", "txt", "dat"];
const TEXT_MEDIA_TYPES: &[&str] = &[
    "text/csv",
    "text/tab-separated-values",
    "text/plain",
    "application/csv",
];

/// A dataset together with the metadata of the file it came from.
pub struct LoadedDataset {
    pub dataset: Box<dyn Dataset>,
    pub source: SourceMetadata,
}

impl std::fmt::Debug for LoadedDataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedDataset")
            .field("strategy", &self.dataset.strategy())
            .field("source", &self.source)
            .finish()
    }
}

/// Loads CSV/TSV exports.
///
/// Inputs whose size is below the threshold are parsed into memory. Larger
/// inputs are validated structurally in one streaming pass and then read
/// again window by window; streams are spooled to a temporary file first.
#[derive(Debug, Clone)]
pub struct Loader {
    threshold_bytes: u64,
    window_rows: usize,
}

impl Loader {
    /// Create a loader with a 64 MiB threshold.
    pub fn new() -> Self {
        Self {
            threshold_bytes: 64 * 1024 * 1024,
            window_rows: DEFAULT_WINDOW_ROWS,
        }
    }

    /// Create a loader using a resolved configuration.
    pub fn from_config(config: &ResolvedConfig) -> Self {
        Self {
            threshold_bytes: config.large_file_threshold_bytes(),
            window_rows: config.options.chunk_rows,
        }
    }

    /// Set the size at which the chunked strategy takes over.
    pub fn with_threshold_bytes(mut self, threshold_bytes: u64) -> Self {
        self.threshold_bytes = threshold_bytes;
        self
    }

    /// Set the rows per scan window.
    pub fn with_window_rows(mut self, window_rows: usize) -> Self {
        self.window_rows = window_rows.max(1);
        self
    }

    /// Load a file from disk.
    pub fn load_path(&self, path: impl AsRef<Path>) -> Result<LoadedDataset> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        let format_hint = recognize_format(extension).ok_or_else(|| {
            BmsCheckError::UnsupportedFormat(format!(
                "'{}' is not a delimited text export",
                path.display()
            ))
        })?;

        let size_bytes = std::fs::metadata(path)
            .map_err(|e| io_error(path, e))?
            .len();
        let file_name = display_name(path);

        if size_bytes >= self.threshold_bytes {
            info!(file = %file_name, size_bytes, "using chunked strategy");
            self.load_chunked(path.to_path_buf(), file_name, None, format_hint)
        } else {
            let bytes = std::fs::read(path).map_err(|e| io_error(path, e))?;
            self.load_in_memory(&bytes, Some(path.to_path_buf()), file_name, format_hint)
        }
    }

    /// Load from a byte stream.
    ///
    /// `format_hint` is a file name, extension or media type. The declared
    /// size picks the strategy; without one the stream is measured while it
    /// is read.
    pub fn load_reader<R: Read>(
        &self,
        mut reader: R,
        format_hint: &str,
        declared_size: Option<u64>,
    ) -> Result<LoadedDataset> {
        let format = recognize_format(format_hint).ok_or_else(|| {
            BmsCheckError::UnsupportedFormat(format!("'{}' is not a delimited text export", format_hint))
        })?;
        let name = stream_name(format_hint);
        let stream_path = PathBuf::from(&name);

        let mut head = Vec::new();
        let go_chunked = match declared_size {
            Some(size) => size >= self.threshold_bytes,
            None => {
                (&mut reader)
                    .take(self.threshold_bytes)
                    .read_to_end(&mut head)
                    .map_err(|e| io_error(&stream_path, e))?;
                head.len() as u64 >= self.threshold_bytes
            }
        };

        if !go_chunked {
            reader
                .read_to_end(&mut head)
                .map_err(|e| io_error(&stream_path, e))?;
            return self.load_in_memory(&head, None, name, format);
        }

        let mut spool = NamedTempFile::new().map_err(|e| io_error(&stream_path, e))?;
        spool
            .write_all(&head)
            .and_then(|_| io::copy(&mut reader, spool.as_file_mut()).map(|_| ()))
            .and_then(|_| spool.as_file_mut().flush())
            .map_err(|e| io_error(spool.path(), e))?;
        info!(file = %name, "spooled stream for chunked strategy");

        let spool_path = spool.path().to_path_buf();
        self.load_chunked(spool_path, name, Some(spool), format)
    }

    fn load_in_memory(
        &self,
        bytes: &[u8],
        path: Option<PathBuf>,
        file_name: String,
        format_hint: &str,
    ) -> Result<LoadedDataset> {
        if bytes.iter().all(|b| b.is_ascii_whitespace()) {
            return Err(BmsCheckError::EmptyFile("no header row".to_string()));
        }

        let delimiter = detect_delimiter(bytes, format_hint)?;
        let mut quotes = QuoteTracker::new(delimiter);
        quotes.feed(bytes);
        quotes.finish()?;

        let mut reader = csv_reader(delimiter).from_reader(bytes);
        let headers = read_headers(&mut reader, path.as_deref())?;

        let mut rows = Vec::new();
        let mut record = csv::ByteRecord::new();
        while reader
            .read_byte_record(&mut record)
            .map_err(|e| BmsCheckError::from_csv(e, path.as_deref()))?
        {
            rows.push(decode_record(&record));
        }

        if rows.is_empty() {
            return Err(BmsCheckError::EmptyFile("no data rows".to_string()));
        }

        let mut hasher = Sha256::new();
        hasher.update(bytes);
        let hash = format!("sha256:{:x}", hasher.finalize());

        let dataset = InMemoryDataset::new(headers, rows).with_window_rows(self.window_rows);
        let source = SourceMetadata::new(
            path,
            file_name,
            hash,
            bytes.len() as u64,
            format_name(delimiter),
            dataset.row_count(),
            dataset.column_count(),
        );

        debug!(
            rows = source.row_count,
            columns = source.column_count,
            "loaded in memory"
        );

        Ok(LoadedDataset {
            dataset: Box::new(dataset),
            source,
        })
    }

    fn load_chunked(
        &self,
        path: PathBuf,
        file_name: String,
        spool: Option<NamedTempFile>,
        format_hint: &str,
    ) -> Result<LoadedDataset> {
        let sample = read_prefix(&path, SNIFF_BYTES)?;
        if sample.iter().all(|b| b.is_ascii_whitespace()) {
            return Err(BmsCheckError::EmptyFile("no header row".to_string()));
        }
        let delimiter = detect_delimiter(&sample, format_hint)?;

        // Pass one: hash the bytes and check quoting.
        let mut file = BufReader::new(File::open(&path).map_err(|e| io_error(&path, e))?);
        let mut hasher = Sha256::new();
        let mut quotes = QuoteTracker::new(delimiter);
        let mut size_bytes = 0u64;
        loop {
            let buf = file.fill_buf().map_err(|e| io_error(&path, e))?;
            if buf.is_empty() {
                break;
            }
            hasher.update(buf);
            quotes.feed(buf);
            let len = buf.len();
            size_bytes += len as u64;
            file.consume(len);
        }
        quotes.finish()?;
        let hash = format!("sha256:{:x}", hasher.finalize());

        // Pass two: check field counts and count rows.
        let file = File::open(&path).map_err(|e| io_error(&path, e))?;
        let mut reader = csv_reader(delimiter).from_reader(BufReader::new(file));
        let headers = read_headers(&mut reader, Some(&path))?;
        let mut record = csv::ByteRecord::new();
        let mut row_count = 0usize;
        while reader
            .read_byte_record(&mut record)
            .map_err(|e| BmsCheckError::from_csv(e, Some(&path)))?
        {
            row_count += 1;
        }

        if row_count == 0 {
            return Err(BmsCheckError::EmptyFile("no data rows".to_string()));
        }

        let source_path = if spool.is_some() { None } else { Some(path.clone()) };
        let column_count = headers.len();
        let dataset = ChunkedDataset::new(
            path,
            delimiter,
            headers,
            row_count,
            self.window_rows,
            spool,
        );
        let source = SourceMetadata::new(
            source_path,
            file_name,
            hash,
            size_bytes,
            format_name(delimiter),
            row_count,
            column_count,
        );

        debug!(rows = row_count, columns = column_count, "structure verified");

        Ok(LoadedDataset {
            dataset: Box::new(dataset),
            source,
        })
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the CSV reader shared by both strategies.
pub(crate) fn csv_reader(delimiter: u8) -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(false)
        .quote(b'"');
    builder
}

/// Decode a record, replacing invalid UTF-8 with U+FFFD.
pub(crate) fn decode_record(record: &csv::ByteRecord) -> Vec<String> {
    record
        .iter()
        .map(|field| String::from_utf8_lossy(field).into_owned())
        .collect()
}

fn read_headers<R: Read>(reader: &mut csv::Reader<R>, path: Option<&Path>) -> Result<Vec<String>> {
    let raw = reader
        .byte_headers()
        .map_err(|e| BmsCheckError::from_csv(e, path))?;

    let names: Vec<String> = raw
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let name = String::from_utf8_lossy(field);
            if i == 0 {
                name.trim_start_matches('\u{feff}').trim().to_string()
            } else {
                name.trim().to_string()
            }
        })
        .collect();

    if names.is_empty() || names.iter().all(|n| n.is_empty()) {
        return Err(BmsCheckError::EmptyFile("no header row".to_string()));
    }

    Ok(unique_headers(names))
}

/// Fill blank header names and suffix duplicates so every column is addressable.
fn unique_headers(names: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::with_capacity(names.len());

    for (i, name) in names.into_iter().enumerate() {
        let base = if name.is_empty() {
            format!("column_{}", i + 1)
        } else {
            name
        };
        let mut candidate = base.clone();
        let mut n = 2;
        while !seen.insert(candidate.clone()) {
            candidate = format!("{}_{}", base, n);
            n += 1;
        }
        if candidate != base {
            warn!(column = %base, renamed = %candidate, "duplicate header renamed");
        }
        out.push(candidate);
    }

    out
}

/// Map a file name, extension or media type to a recognized format.
fn recognize_format(hint: &str) -> Option<&'static str> {
    let hint = hint.trim().to_ascii_lowercase();
    let hint = hint.split(';').next().unwrap_or_default().trim();

    if hint.contains('/') && !hint.contains('.') {
        return match *TEXT_MEDIA_TYPES.iter().find(|t| **t == hint)? {
            "text/tab-separated-values" => Some("tsv"),
            "text/plain" => Some("txt"),
            _ => Some("csv"),
        };
    }

    let extension = hint.rsplit('.').next().unwrap_or_default();
    TEXT_EXTENSIONS.iter().find(|e| **e == extension).copied()
}

fn stream_name(hint: &str) -> String {
    let trimmed = hint.trim();
    if trimmed.contains('.') && !trimmed.contains('/') {
        trimmed.to_string()
    } else {
        "<stream>".to_string()
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn io_error(path: &Path, source: io::Error) -> BmsCheckError {
    BmsCheckError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn read_prefix(path: &Path, limit: u64) -> Result<Vec<u8>> {
    let file = File::open(path).map_err(|e| io_error(path, e))?;
    let mut buf = Vec::new();
    file.take(limit)
        .read_to_end(&mut buf)
        .map_err(|e| io_error(path, e))?;
    Ok(buf)
}

fn format_name(delimiter: u8) -> String {
    match delimiter {
        b'\t' => "tsv",
        b',' => "csv",
        b';' => "csv-semicolon",
        b'|' => "psv",
        _ => "delimited",
    }
    .to_string()
}

/// Detect the delimiter by analyzing the first few lines.
///
/// A `.tsv` hint falls back to tab and anything else to comma when no
/// candidate occurs (single-column files).
fn detect_delimiter(bytes: &[u8], format_hint: &str) -> Result<u8> {
    let reader = BufReader::new(bytes);
    let lines: Vec<String> = reader
        .lines()
        .take(10)
        .filter_map(|l| l.ok())
        .filter(|l| !l.trim().is_empty())
        .collect();

    if lines.is_empty() {
        return Err(BmsCheckError::EmptyFile("no lines to analyze".to_string()));
    }

    let mut best_delimiter = if format_hint == "tsv" { b'\t' } else { b',' };
    let mut best_score = 0;

    for &delim in DELIMITERS {
        let counts: Vec<usize> = lines
            .iter()
            .map(|line| count_delimiter_in_line(line, delim))
            .collect();

        let first_count = counts[0];
        if first_count == 0 {
            continue;
        }

        let consistent = counts.iter().all(|&c| c == first_count);
        let variance: f64 = if counts.len() > 1 {
            let mean = counts.iter().sum::<usize>() as f64 / counts.len() as f64;
            counts.iter().map(|&c| (c as f64 - mean).powi(2)).sum::<f64>() / counts.len() as f64
        } else {
            0.0
        };

        // Tab is rare inside values, so it wins ties.
        let score = if consistent {
            first_count * 1000 + (if delim == b'\t' { 100 } else { 0 })
        } else if variance < 1.0 {
            first_count * 100
        } else {
            first_count
        };

        if score > best_score {
            best_score = score;
            best_delimiter = delim;
        }
    }

    Ok(best_delimiter)
}

/// Count delimiter occurrences in a line, respecting quotes.
fn count_delimiter_in_line(line: &str, delimiter: u8) -> usize {
    let delim_char = delimiter as char;
    let mut count = 0;
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            c if c == delim_char && !in_quotes => count += 1,
            _ => {}
        }
    }

    count
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuoteState {
    Unquoted { field_start: bool },
    Quoted,
    QuoteInQuoted,
}

/// Tracks RFC 4180 quoting across buffers to catch an unterminated field.
#[derive(Debug)]
struct QuoteTracker {
    delimiter: u8,
    state: QuoteState,
}

impl QuoteTracker {
    fn new(delimiter: u8) -> Self {
        Self {
            delimiter,
            state: QuoteState::Unquoted { field_start: true },
        }
    }

    fn feed(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.state = match self.state {
                QuoteState::Unquoted { field_start: true } if b == b'"' => QuoteState::Quoted,
                QuoteState::Unquoted { .. } => QuoteState::Unquoted {
                    field_start: self.is_boundary(b),
                },
                QuoteState::Quoted if b == b'"' => QuoteState::QuoteInQuoted,
                QuoteState::Quoted => QuoteState::Quoted,
                QuoteState::QuoteInQuoted if b == b'"' => QuoteState::Quoted,
                QuoteState::QuoteInQuoted => QuoteState::Unquoted {
                    field_start: self.is_boundary(b),
                },
            };
        }
    }

    fn is_boundary(&self, b: u8) -> bool {
        b == self.delimiter || b == b'\n' || b == b'\r'
    }

    fn finish(&self) -> Result<()> {
        if self.state == QuoteState::Quoted {
            Err(BmsCheckError::CorruptFile {
                row: None,
                message: "unterminated quoted field".to_string(),
            })
        } else {
            Ok(())
        }
    }
}
