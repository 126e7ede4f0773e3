//! Validation engine: classification, two scan passes, naming and scoring.

use std::ops::ControlFlow;

use chrono::NaiveDateTime;
use tracing::{debug, info};

use crate::cancel::CancellationToken;
use crate::config::ResolvedConfig;
use crate::error::Result;
use crate::inference::ColumnClassifier;
use crate::input::values::{format_timestamp, parse_timestamp};
use crate::input::{Dataset, LoadStrategy, RowWindow, SourceMetadata};
use crate::schema::{ColumnProfile, ColumnRole};

use super::aggregate::aggregate;
use super::cells::{CellClass, CellClassifier};
use super::issue::{DetectorKind, Issue};
use super::junk::junk_issue;
use super::naming::check_naming;
use super::null::{NullProfile, NullTally};
use super::range::RangeCheck;
use super::result::{ResultMetadata, SkippedCheck, ValidationResult};
use super::spike::SpikeDetector;
use super::stats::StreamingStats;

/// Parsed time-axis values for the rows of one window.
type WindowTimes = Vec<Option<NaiveDateTime>>;

/// Runs every detector over a dataset and aggregates the result.
#[derive(Debug, Clone)]
pub struct ValidationEngine {
    config: ResolvedConfig,
}

impl ValidationEngine {
    /// Create an engine for a resolved configuration.
    pub fn new(config: ResolvedConfig) -> Self {
        Self { config }
    }

    /// The configuration this engine runs with.
    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    /// Validate a dataset.
    ///
    /// The first pass classifies cells, reports junk and range violations and
    /// accumulates per-column statistics and null layouts. The second pass
    /// grades each null cell and runs the spike methods against the finished
    /// statistics. Cancellation is checked between windows and between
    /// columns and yields `Err(Cancelled)` with no partial result.
    pub fn run(
        &self,
        dataset: &dyn Dataset,
        source: SourceMetadata,
        cancel: &CancellationToken,
    ) -> Result<ValidationResult> {
        cancel.check()?;
        let config = &self.config;
        let strategy = dataset.strategy();

        info!(
            file = %source.file,
            rows = dataset.row_count(),
            columns = dataset.column_count(),
            strategy = ?strategy,
            "validating"
        );

        let classification = ColumnClassifier::new(config).classify(dataset)?;
        let columns = classification.columns;
        let time_axis = classification.time_axis;

        let mut skipped_checks = Vec::new();
        let mut issues = Vec::new();

        // Pass 1
        let mut first: Vec<FirstPass> = columns
            .iter()
            .filter(|c| matches!(c.role, ColumnRole::Sensor | ColumnRole::Identifier))
            .map(|c| FirstPass::new(c, config, strategy, &mut skipped_checks))
            .collect();

        if !first.is_empty() {
            dataset.scan(&mut |window| {
                cancel.check()?;
                let times = time_axis.map(|col| window_times(&window, col));
                for_each_column(&mut first, |scanner| {
                    scanner.observe(&window, times.as_deref())
                });
                Ok(ControlFlow::Continue(()))
            })?;
        }

        // Finish statistics and plan the second pass.
        let mut approximated_columns = Vec::new();
        let mut second = Vec::new();
        for scanner in first {
            cancel.check()?;
            let (pass, column_issues) = scanner.finish(
                dataset.row_count(),
                config,
                time_axis.is_some(),
                &mut skipped_checks,
            );
            issues.extend(column_issues);
            let Some(pass) = pass else {
                continue;
            };
            if pass.approximate {
                approximated_columns.push(pass.profile.name.clone());
            }
            if pass.has_work() {
                second.push(pass);
            }
        }

        // Pass 2
        if !second.is_empty() {
            dataset.scan(&mut |window| {
                cancel.check()?;
                let times = time_axis.map(|col| window_times(&window, col));
                for_each_column(&mut second, |scanner| {
                    scanner.observe(&window, times.as_deref())
                });
                Ok(ControlFlow::Continue(()))
            })?;
        }
        for scanner in second {
            cancel.check()?;
            issues.extend(scanner.issues);
        }

        let naming = check_naming(&columns, config);
        if let Some(reason) = naming.skipped {
            skipped_checks.push(SkippedCheck::new(None, DetectorKind::Naming, reason));
        }
        issues.extend(naming.issues);

        cancel.check()?;
        let aggregation = aggregate(issues, &columns, &config.options.scoring);

        info!(
            issues = aggregation.issues.len(),
            critical = aggregation.totals.critical,
            high = aggregation.totals.high,
            score = aggregation.score,
            "validation complete"
        );

        let time_axis = time_axis.map(|i| columns[i].name.clone());
        Ok(ValidationResult {
            score: aggregation.score,
            totals: aggregation.totals,
            column_counts: aggregation.column_counts,
            issues: aggregation.issues,
            columns,
            metadata: ResultMetadata {
                source,
                strategy,
                approximate: !approximated_columns.is_empty(),
                approximated_columns,
                skipped_checks,
                vendor: naming.vendor,
                time_axis,
                engine_version: env!("CARGO_PKG_VERSION").to_string(),
            },
        })
    }
}

/// Apply `f` to every column scanner for the current window.
#[cfg(feature = "parallel")]
fn for_each_column<S, F>(scanners: &mut [S], f: F)
where
    S: Send,
    F: Fn(&mut S) + Sync + Send,
{
    use rayon::prelude::*;
    scanners.par_iter_mut().for_each(f);
}

/// Apply `f` to every column scanner for the current window.
#[cfg(not(feature = "parallel"))]
fn for_each_column<S, F>(scanners: &mut [S], f: F)
where
    F: Fn(&mut S),
{
    scanners.iter_mut().for_each(f);
}

fn window_times(window: &RowWindow<'_>, col: usize) -> WindowTimes {
    window
        .column(col)
        .map(|(_, raw)| parse_timestamp(raw))
        .collect()
}

fn timestamp_at(times: Option<&[Option<NaiveDateTime>]>, offset: usize) -> Option<NaiveDateTime> {
    times.and_then(|t| t.get(offset).copied().flatten())
}

/// First-pass scanner for one column.
struct FirstPass<'a> {
    profile: &'a ColumnProfile,
    cells: CellClassifier<'a>,
    range: Option<RangeCheck>,
    tally: NullTally,
    stats: StreamingStats,
    issues: Vec<Issue>,
}

impl<'a> FirstPass<'a> {
    fn new(
        profile: &'a ColumnProfile,
        config: &'a ResolvedConfig,
        strategy: LoadStrategy,
        skipped: &mut Vec<SkippedCheck>,
    ) -> Self {
        let range = if profile.is_sensor() {
            match profile.physical_type {
                Some(ty) => match config.range_bound(ty) {
                    Some(bound) => Some(RangeCheck::new(ty, bound)),
                    None => {
                        skipped.push(SkippedCheck::new(
                            Some(&profile.name),
                            DetectorKind::Range,
                            format!("no range bound configured for {}", ty),
                        ));
                        None
                    }
                },
                None => {
                    skipped.push(SkippedCheck::new(
                        Some(&profile.name),
                        DetectorKind::Range,
                        "physical type could not be inferred",
                    ));
                    None
                }
            }
        } else {
            None
        };

        let stats = match strategy {
            LoadStrategy::InMemory => StreamingStats::exact(),
            LoadStrategy::Chunked => StreamingStats::new(
                config.options.quantile_sample_size,
                profile.position as u64,
            ),
        };

        Self {
            profile,
            cells: CellClassifier::new(config, profile),
            range,
            tally: NullTally::new(),
            stats,
            issues: Vec::new(),
        }
    }

    fn observe(&mut self, window: &RowWindow<'_>, times: Option<&[Option<NaiveDateTime>]>) {
        let name = self.profile.name.as_str();
        for (offset, (row, raw)) in window.column(self.profile.position).enumerate() {
            match self.cells.classify(raw) {
                CellClass::Null(_) => self.tally.observe_null(row),
                CellClass::Junk(reason) => {
                    let ts = timestamp_at(times, offset);
                    self.issues.push(junk_issue(
                        name,
                        row,
                        raw,
                        &reason,
                        ts.as_ref().map(format_timestamp),
                    ));
                }
                CellClass::Reading(value) => {
                    self.stats.add(value);
                    if let Some(ref range) = self.range {
                        let ts = timestamp_at(times, offset);
                        if let Some(issue) =
                            range.check(name, row, value, raw, ts.as_ref().map(format_timestamp))
                        {
                            self.issues.push(issue);
                        }
                    }
                }
                CellClass::Text => {}
            }
        }
    }

    /// Close the first pass and set up the second one, if it has work.
    fn finish(
        self,
        row_count: usize,
        config: &'a ResolvedConfig,
        has_time_axis: bool,
        skipped: &mut Vec<SkippedCheck>,
    ) -> (Option<SecondPass<'a>>, Vec<Issue>) {
        let profile = self.profile;
        let mut issues = self.issues;
        let nulls = self.tally.finish(row_count, &config.options);

        if let Some(issue) = nulls.column_issue(&profile.name) {
            debug!(column = %profile.name, "column entirely null");
            issues.push(issue);
            if profile.is_sensor() {
                skipped.push(SkippedCheck::new(
                    Some(&profile.name),
                    DetectorKind::Spike,
                    "column has no readings",
                ));
            }
            return (None, issues);
        }

        let nulls = (nulls.count() > 0).then_some(nulls);

        let summary = self.stats.summarize();
        let spike = if profile.is_sensor() {
            let plan = SpikeDetector::plan(profile, &summary, config, has_time_axis);
            for reason in plan.skipped {
                skipped.push(SkippedCheck::new(Some(&profile.name), DetectorKind::Spike, reason));
            }
            plan.detector
        } else {
            None
        };

        debug!(
            column = %profile.name,
            readings = summary.count,
            nulls = nulls.as_ref().map_or(0, NullProfile::count),
            first_pass_issues = issues.len(),
            approximate = summary.approximate,
            "first pass finished"
        );

        let pass = SecondPass {
            profile,
            cells: self.cells,
            nulls,
            spike,
            approximate: summary.approximate,
            issues: Vec::new(),
        };
        (Some(pass), issues)
    }
}

/// Second-pass scanner for one column.
struct SecondPass<'a> {
    profile: &'a ColumnProfile,
    cells: CellClassifier<'a>,
    nulls: Option<NullProfile>,
    spike: Option<SpikeDetector>,
    approximate: bool,
    issues: Vec<Issue>,
}

impl SecondPass<'_> {
    fn has_work(&self) -> bool {
        self.nulls.is_some() || self.spike.is_some()
    }

    fn observe(&mut self, window: &RowWindow<'_>, times: Option<&[Option<NaiveDateTime>]>) {
        let name = self.profile.name.as_str();
        for (offset, (row, raw)) in window.column(self.profile.position).enumerate() {
            match self.cells.classify(raw) {
                CellClass::Null(kind) => {
                    if let Some(ref nulls) = self.nulls {
                        let ts = timestamp_at(times, offset);
                        self.issues.push(nulls.cell_issue(
                            name,
                            row,
                            raw,
                            kind,
                            ts.as_ref().map(format_timestamp),
                        ));
                    }
                }
                CellClass::Reading(value) => {
                    if let Some(ref mut spike) = self.spike {
                        let ts = timestamp_at(times, offset);
                        if let Some(issue) = spike.observe(name, row, value, raw, ts) {
                            self.issues.push(issue);
                        }
                    }
                }
                CellClass::Junk(_) | CellClass::Text => {}
            }
        }
    }
}
