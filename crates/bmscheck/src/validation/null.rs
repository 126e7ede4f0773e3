//! Null detector: missing and placeholder values.

use crate::config::ValidationConfig;

use super::cells::NullKind;
use super::issue::{DetectorKind, Issue, Severity};

/// A contiguous block of null rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NullRun {
    pub start: usize,
    pub len: usize,
}

impl NullRun {
    fn end(&self) -> usize {
        self.start + self.len
    }
}

/// First-pass tally of a column's null runs.
///
/// Rows must be observed in ascending order.
#[derive(Debug, Clone, Default)]
pub struct NullTally {
    runs: Vec<NullRun>,
    count: usize,
}

impl NullTally {
    /// Create an empty tally.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a null cell.
    pub fn observe_null(&mut self, row: usize) {
        self.count += 1;
        match self.runs.last_mut() {
            Some(run) if run.end() == row => run.len += 1,
            _ => self.runs.push(NullRun { start: row, len: 1 }),
        }
    }

    /// Number of null cells recorded.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Finish the tally once every row was seen.
    pub fn finish(self, row_count: usize, options: &ValidationConfig) -> NullProfile {
        let mut prefix = Vec::with_capacity(self.runs.len());
        let mut before = 0;
        for run in &self.runs {
            prefix.push(before);
            before += run.len;
        }

        NullProfile {
            runs: self.runs,
            prefix,
            count: self.count,
            row_count,
            thresholds: NullThresholds::from(options),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct NullThresholds {
    run_medium: usize,
    run_high: usize,
    window_rows: usize,
    window_fraction: f64,
    fraction_medium: f64,
    fraction_high: f64,
}

impl From<&ValidationConfig> for NullThresholds {
    fn from(options: &ValidationConfig) -> Self {
        Self {
            run_medium: options.null_run_medium,
            run_high: options.null_run_high,
            window_rows: options.null_window_rows,
            window_fraction: options.null_window_fraction,
            fraction_medium: options.null_fraction_medium,
            fraction_high: options.null_fraction_high,
        }
    }
}

/// Complete null layout of a column, used to grade each null cell.
#[derive(Debug, Clone)]
pub struct NullProfile {
    runs: Vec<NullRun>,
    /// Nulls in all runs before run `i`.
    prefix: Vec<usize>,
    count: usize,
    row_count: usize,
    thresholds: NullThresholds,
}

impl NullProfile {
    /// Number of null cells.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Share of the column's rows that are null.
    pub fn fraction(&self) -> f64 {
        if self.row_count == 0 {
            0.0
        } else {
            self.count as f64 / self.row_count as f64
        }
    }

    /// Check whether every row is null.
    pub fn is_all_null(&self) -> bool {
        self.row_count > 0 && self.count == self.row_count
    }

    /// The single column-level issue for a fully null column.
    pub fn column_issue(&self, column: &str) -> Option<Issue> {
        if !self.is_all_null() {
            return None;
        }
        Some(Issue::new(
            DetectorKind::Null,
            Severity::Critical,
            column,
            format!("column is entirely null ({} rows)", self.row_count),
        ))
    }

    /// Build the issue for a null cell at `row`.
    pub fn cell_issue(
        &self,
        column: &str,
        row: usize,
        raw: &str,
        kind: NullKind,
        timestamp: Option<String>,
    ) -> Issue {
        let run = self.run_len(row);
        let severity = self.severity_at(row);

        let mut message = match kind {
            NullKind::Empty => "empty cell".to_string(),
            NullKind::Placeholder => format!("null placeholder '{}'", raw.trim()),
        };
        if run > 1 {
            message.push_str(&format!(" in a run of {} nulls", run));
        }
        if self.fraction() >= self.thresholds.fraction_medium {
            message.push_str(&format!("; column is {:.1}% null", self.fraction() * 100.0));
        }

        Issue::new(DetectorKind::Null, severity, column, message)
            .at_row(row)
            .with_timestamp(timestamp)
            .with_raw_value(raw)
    }

    /// Grade a null cell by column fraction, run length and local density.
    pub fn severity_at(&self, row: usize) -> Severity {
        let t = &self.thresholds;
        let fraction = self.fraction();
        let run = self.run_len(row);

        if fraction >= t.fraction_high || run > t.run_high {
            Severity::High
        } else if run > t.run_medium
            || fraction >= t.fraction_medium
            || self.local_density(row) >= t.window_fraction
        {
            Severity::Medium
        } else {
            Severity::Low
        }
    }

    /// Null share of the window of `window_rows` rows centred on `row`.
    pub fn local_density(&self, row: usize) -> f64 {
        let half = self.thresholds.window_rows / 2;
        let lo = row.saturating_sub(half);
        let hi = (row + self.thresholds.window_rows - half).min(self.row_count);
        if hi <= lo {
            return 0.0;
        }
        let nulls = self.nulls_before(hi) - self.nulls_before(lo);
        nulls as f64 / (hi - lo) as f64
    }

    /// Length of the null run containing `row` (0 if the row is not null).
    pub fn run_len(&self, row: usize) -> usize {
        let idx = self.runs.partition_point(|run| run.start <= row);
        match idx.checked_sub(1).map(|i| self.runs[i]) {
            Some(run) if row < run.end() => run.len,
            _ => 0,
        }
    }

    /// Nulls in rows `0..row`.
    fn nulls_before(&self, row: usize) -> usize {
        let idx = self.runs.partition_point(|run| run.start < row);
        match idx.checked_sub(1) {
            Some(i) => {
                let run = self.runs[i];
                self.prefix[i] + run.len.min(row - run.start)
            }
            None => 0,
        }
    }
}
