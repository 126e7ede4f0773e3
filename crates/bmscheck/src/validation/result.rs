//! Validation result returned to callers.

use std::fmt::Write as _;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::input::{LoadStrategy, SourceMetadata};
use crate::schema::ColumnProfile;

use super::issue::{DetectorKind, Issue, Severity, SeverityCounts};

/// Issues listed per tier in the text summary.
const SUMMARY_ISSUES_PER_TIER: usize = 5;

/// A detector that did not run for a column, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedCheck {
    /// Affected column (`None` for dataset-wide checks).
    pub column: Option<String>,
    /// Detector that was skipped.
    pub detector: DetectorKind,
    /// Reason shown to the user.
    pub reason: String,
}

impl SkippedCheck {
    /// Create a skipped-check record.
    pub fn new(column: Option<&str>, detector: DetectorKind, reason: impl Into<String>) -> Self {
        Self {
            column: column.map(|c| c.to_string()),
            detector,
            reason: reason.into(),
        }
    }
}

/// How a result was produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultMetadata {
    /// The validated file.
    pub source: SourceMetadata,
    /// How the dataset was held.
    pub strategy: LoadStrategy,
    /// Whether any statistic was estimated from a sample.
    pub approximate: bool,
    /// Columns whose quantiles were estimated.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub approximated_columns: Vec<String>,
    /// Detectors that did not apply.
    #[serde(default)]
    pub skipped_checks: Vec<SkippedCheck>,
    /// Vendor whose naming convention was applied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    /// Column used as the time axis.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_axis: Option<String>,
    /// Version of the engine that produced the result.
    pub engine_version: String,
}

/// Complete outcome of validating one export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Quality score, 0-100 with two decimals.
    pub score: f64,
    /// Issue counts per severity.
    pub totals: SeverityCounts,
    /// Issue counts per column, in column order.
    pub column_counts: IndexMap<String, SeverityCounts>,
    /// All issues, most severe first.
    pub issues: Vec<Issue>,
    /// Column classification.
    pub columns: Vec<ColumnProfile>,
    /// Run metadata.
    pub metadata: ResultMetadata,
}

impl ValidationResult {
    /// Issues of one severity.
    pub fn issues_with_severity(&self, severity: Severity) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(move |i| i.severity == severity)
    }

    /// Issues for one column.
    pub fn issues_for_column<'a>(&'a self, column: &'a str) -> impl Iterator<Item = &'a Issue> {
        self.issues.iter().filter(move |i| i.column == column)
    }

    /// Issues raised by one detector.
    pub fn issues_of_kind(&self, kind: DetectorKind) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(move |i| i.kind == kind)
    }

    /// Serialize as pretty JSON.
    pub fn to_json_pretty(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Render a plain-text report grouped by severity.
    pub fn render_summary(&self) -> String {
        let mut out = String::new();
        let source = &self.metadata.source;

        let _ = writeln!(out, "BMS data quality report: {}", source.file);
        let _ = writeln!(
            out,
            "Rows: {}  Columns: {}  Format: {}",
            source.row_count, source.column_count, source.format
        );
        let _ = writeln!(out, "Quality score: {:.2} / 100", self.score);
        if let Some(ref vendor) = self.metadata.vendor {
            let _ = writeln!(out, "Naming convention: {}", vendor);
        }
        if self.metadata.approximate {
            let _ = writeln!(
                out,
                "Note: quantiles estimated from samples for {}",
                self.metadata.approximated_columns.join(", ")
            );
        }

        if self.issues.is_empty() {
            let _ = writeln!(out, "\nNo issues found.");
        }

        for severity in Severity::ALL {
            let count = self.totals.get(severity);
            if count == 0 {
                continue;
            }
            let _ = writeln!(out, "\n{} ({})", severity.label(), count);

            for (column, counts) in &self.column_counts {
                let n = counts.get(severity);
                if n > 0 {
                    let _ = writeln!(out, "  {}: {}", column, n);
                }
            }

            for issue in self.issues_with_severity(severity).take(SUMMARY_ISSUES_PER_TIER) {
                let location = match issue.row {
                    Some(row) => format!("row {}", row),
                    None => "column".to_string(),
                };
                let _ = writeln!(
                    out,
                    "    {} {} [{}] {}: {}",
                    issue.id, issue.column, issue.kind, location, issue.message
                );
            }
            if count > SUMMARY_ISSUES_PER_TIER {
                let _ = writeln!(out, "    ... and {} more", count - SUMMARY_ISSUES_PER_TIER);
            }
        }

        if !self.metadata.skipped_checks.is_empty() {
            let _ = writeln!(out, "\nSkipped checks:");
            for skipped in &self.metadata.skipped_checks {
                let _ = writeln!(
                    out,
                    "  {} {}: {}",
                    skipped.column.as_deref().unwrap_or("*"),
                    skipped.detector,
                    skipped.reason
                );
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnRole;

    fn sample_result() -> ValidationResult {
        let mut issue = Issue::new(DetectorKind::Null, Severity::Critical, "ZN2_T", "column is entirely null (10 rows)");
        issue.id = "iss_00001".to_string();
        let mut totals = SeverityCounts::default();
        totals.add(Severity::Critical);
        let mut column_counts = IndexMap::new();
        column_counts.insert("ZN2_T".to_string(), totals);

        ValidationResult {
            score: 95.2,
            totals,
            column_counts,
            issues: vec![issue],
            columns: vec![ColumnProfile::new("ZN2_T", 0).with_role(ColumnRole::Sensor)],
            metadata: ResultMetadata {
                source: SourceMetadata::new(
                    None,
                    "trend.csv",
                    "sha256:00".to_string(),
                    120,
                    "csv".to_string(),
                    10,
                    1,
                ),
                strategy: LoadStrategy::InMemory,
                approximate: false,
                approximated_columns: Vec::new(),
                skipped_checks: vec![SkippedCheck::new(
                    Some("ZN2_T"),
                    DetectorKind::Spike,
                    "only 0 readings, spike detection needs 10",
                )],
                vendor: None,
                time_axis: None,
                engine_version: "0.1.0".to_string(),
            },
        }
    }

    #[test]
    fn test_render_summary() {
        let text = sample_result().render_summary();
        assert!(text.contains("trend.csv"));
        assert!(text.contains("Quality score: 95.20 / 100"));
        assert!(text.contains("Critical (1)"));
        assert!(text.contains("iss_00001 ZN2_T [null] column"));
        assert!(text.contains("Skipped checks:"));
        assert!(!text.contains("High ("));
    }

    #[test]
    fn test_json_field_names() {
        let json = serde_json::to_value(sample_result()).unwrap();
        assert_eq!(json["score"], 95.2);
        assert_eq!(json["totals"]["critical"], 1);
        assert_eq!(json["column_counts"]["ZN2_T"]["critical"], 1);
        assert_eq!(json["metadata"]["strategy"], "in_memory");
        assert_eq!(json["metadata"]["skipped_checks"][0]["detector"], "spike");
        assert!(json["metadata"].get("vendor").is_none());
    }
}
