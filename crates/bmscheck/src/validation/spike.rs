//! Spike detector: four outlier methods and their consolidation.

use chrono::NaiveDateTime;

use crate::config::ResolvedConfig;
use crate::input::values::format_timestamp;
use crate::schema::ColumnProfile;

use super::issue::{DetectorKind, Issue, Severity, SpikeMethod};
use super::stats::{ColumnSummary, RollingWindow};

/// Scale factor making the MAD consistent with a normal standard deviation.
const MAD_SCALE: f64 = 0.6745;

#[derive(Debug, Clone)]
enum ZScoreMode {
    Global { mean: f64, std: f64 },
    Rolling { window: RollingWindow, min_points: usize },
}

#[derive(Debug, Clone)]
struct RateOfChange {
    max_per_minute: f64,
    max_gap_seconds: i64,
    /// The previous timestamped reading.
    reference: Option<(f64, NaiveDateTime)>,
}

impl RateOfChange {
    fn check(&mut self, value: f64, ts: Option<NaiveDateTime>) -> bool {
        let Some(ts) = ts else {
            self.reference = None;
            return false;
        };

        let flagged = match self.reference {
            Some((prev, prev_ts)) => {
                let millis = (ts - prev_ts).num_milliseconds().abs();
                if millis == 0 || millis > self.max_gap_seconds.saturating_mul(1000) {
                    false
                } else {
                    let minutes = millis as f64 / 60_000.0;
                    (value - prev).abs() / minutes > self.max_per_minute
                }
            }
            None => false,
        };

        self.reference = Some((value, ts));
        flagged
    }
}

/// Outcome of planning spike detection for one column.
#[derive(Debug)]
pub struct SpikePlan {
    /// The configured detector, or `None` when the column is skipped.
    pub detector: Option<SpikeDetector>,
    /// Methods (or the whole detector) that cannot run, with reasons.
    pub skipped: Vec<String>,
}

/// Second-pass per-point outlier verdicts for one sensor column.
#[derive(Debug, Clone)]
pub struct SpikeDetector {
    z_threshold: f64,
    mz_threshold: f64,
    zscore: Option<ZScoreMode>,
    iqr_fences: Option<(f64, f64)>,
    modified_z: Option<(f64, f64)>,
    rate: Option<RateOfChange>,
}

impl SpikeDetector {
    /// Configure the methods that apply to a column with summary `summary`.
    pub fn plan(
        profile: &ColumnProfile,
        summary: &ColumnSummary,
        config: &ResolvedConfig,
        has_time_axis: bool,
    ) -> SpikePlan {
        let options = &config.options;
        let mut skipped = Vec::new();

        if summary.count < options.min_spike_points {
            skipped.push(format!(
                "only {} readings, spike detection needs {}",
                summary.count, options.min_spike_points
            ));
            return SpikePlan {
                detector: None,
                skipped,
            };
        }

        let zscore = if summary.count > options.zscore_rolling_above {
            Some(ZScoreMode::Rolling {
                window: RollingWindow::new(options.zscore_window),
                min_points: options.min_spike_points.min(options.zscore_window),
            })
        } else if summary.std > 0.0 {
            Some(ZScoreMode::Global {
                mean: summary.mean,
                std: summary.std,
            })
        } else {
            skipped.push("z_score: zero variance".to_string());
            None
        };

        let iqr = summary.iqr();
        let iqr_fences = if iqr > 0.0 {
            Some((
                summary.q1 - options.iqr_k * iqr,
                summary.q3 + options.iqr_k * iqr,
            ))
        } else {
            skipped.push("iqr: zero interquartile range".to_string());
            None
        };

        let modified_z = if summary.mad > 0.0 {
            Some((summary.median, summary.mad))
        } else {
            skipped.push("modified_z: zero median absolute deviation".to_string());
            None
        };

        let rate = match (has_time_axis, profile.physical_type) {
            (false, _) => {
                skipped.push("rate_of_change: no timestamp column".to_string());
                None
            }
            (true, None) => {
                skipped.push("rate_of_change: unknown sensor type".to_string());
                None
            }
            (true, Some(ty)) => match config.max_rate(ty) {
                Some(max_per_minute) => Some(RateOfChange {
                    max_per_minute,
                    max_gap_seconds: options.max_gap_seconds,
                    reference: None,
                }),
                None => {
                    skipped.push(format!("rate_of_change: no rate limit for {}", ty));
                    None
                }
            },
        };

        SpikePlan {
            detector: Some(SpikeDetector {
                z_threshold: options.z_threshold,
                mz_threshold: options.mz_threshold,
                zscore,
                iqr_fences,
                modified_z,
                rate,
            }),
            skipped,
        }
    }

    /// Run every method on the next reading, in row order.
    pub fn methods_for(&mut self, value: f64, ts: Option<NaiveDateTime>) -> Vec<SpikeMethod> {
        let mut methods = Vec::new();

        match self.zscore {
            Some(ZScoreMode::Global { mean, std }) => {
                if (value - mean).abs() / std > self.z_threshold {
                    methods.push(SpikeMethod::ZScore);
                }
            }
            Some(ZScoreMode::Rolling {
                ref mut window,
                min_points,
            }) => {
                let std = window.std();
                if window.len() >= min_points
                    && std > 0.0
                    && (value - window.mean()).abs() / std > self.z_threshold
                {
                    methods.push(SpikeMethod::ZScore);
                }
                window.push(value);
            }
            None => {}
        }

        if let Some((lo, hi)) = self.iqr_fences {
            if value < lo || value > hi {
                methods.push(SpikeMethod::Iqr);
            }
        }

        if let Some((median, mad)) = self.modified_z {
            if MAD_SCALE * (value - median).abs() / mad > self.mz_threshold {
                methods.push(SpikeMethod::ModifiedZ);
            }
        }

        if let Some(ref mut rate) = self.rate {
            if rate.check(value, ts) {
                methods.push(SpikeMethod::RateOfChange);
            }
        }

        methods
    }

    /// Judge a reading and build an issue when the methods agree.
    ///
    /// Two or more methods make a high issue. Rate-of-Change alone is
    /// medium; any other single method is not reported.
    pub fn observe(
        &mut self,
        column: &str,
        row: usize,
        value: f64,
        raw: &str,
        ts: Option<NaiveDateTime>,
    ) -> Option<Issue> {
        let methods = self.methods_for(value, ts);
        let severity = match methods.as_slice() {
            [] => return None,
            [SpikeMethod::RateOfChange] => Severity::Medium,
            [_] => return None,
            _ => Severity::High,
        };

        let labels: Vec<&str> = methods.iter().map(|m| m.label()).collect();
        Some(
            Issue::new(
                DetectorKind::Spike,
                severity,
                column,
                format!("reading {} flagged by {}", value, labels.join(", ")),
            )
            .at_row(row)
            .with_timestamp(ts.as_ref().map(format_timestamp))
            .with_raw_value(raw)
            .with_methods(methods),
        )
    }
}
