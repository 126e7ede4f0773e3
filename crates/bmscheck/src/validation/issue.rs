//! Issue types produced by the detectors.

use serde::{Deserialize, Serialize};

/// Detector that raised an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectorKind {
    /// Missing or placeholder values.
    Null,
    /// Garbage strings and error sentinels in numeric columns.
    Junk,
    /// Statistical outliers and implausible jumps.
    Spike,
    /// Readings outside physical bounds.
    Range,
    /// Column names breaking the vendor convention.
    Naming,
}

impl DetectorKind {
    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            DetectorKind::Null => "Null",
            DetectorKind::Junk => "Junk",
            DetectorKind::Spike => "Spike",
            DetectorKind::Range => "Range",
            DetectorKind::Naming => "Naming",
        }
    }

    /// Serialized key.
    pub fn key(&self) -> &'static str {
        match self {
            DetectorKind::Null => "null",
            DetectorKind::Junk => "junk",
            DetectorKind::Spike => "spike",
            DetectorKind::Range => "range",
            DetectorKind::Naming => "naming",
        }
    }
}

impl std::fmt::Display for DetectorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Severity level of an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Cosmetic or convention issue.
    Low,
    /// Worth reviewing.
    Medium,
    /// Likely corrupt data.
    High,
    /// Data that cannot be trusted.
    Critical,
}

impl Severity {
    /// Every tier, most severe first.
    pub const ALL: [Severity; 4] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
    ];

    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Low => "Low",
            Severity::Medium => "Medium",
            Severity::High => "High",
            Severity::Critical => "Critical",
        }
    }

    /// Serialized key.
    pub fn key(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Outlier method that flagged a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpikeMethod {
    ZScore,
    Iqr,
    ModifiedZ,
    RateOfChange,
}

impl SpikeMethod {
    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            SpikeMethod::ZScore => "Z-Score",
            SpikeMethod::Iqr => "IQR",
            SpikeMethod::ModifiedZ => "Modified Z-Score",
            SpikeMethod::RateOfChange => "Rate-of-Change",
        }
    }
}

/// Per-severity issue counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl SeverityCounts {
    /// Count one issue of `severity`.
    pub fn add(&mut self, severity: Severity) {
        *self.get_mut(severity) += 1;
    }

    /// Get the count for a severity.
    pub fn get(&self, severity: Severity) -> usize {
        match severity {
            Severity::Critical => self.critical,
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
        }
    }

    fn get_mut(&mut self, severity: Severity) -> &mut usize {
        match severity {
            Severity::Critical => &mut self.critical,
            Severity::High => &mut self.high,
            Severity::Medium => &mut self.medium,
            Severity::Low => &mut self.low,
        }
    }

    /// Total across all tiers.
    pub fn total(&self) -> usize {
        self.critical + self.high + self.medium + self.low
    }
}

/// A single data-quality finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    /// Stable identifier, assigned after final ordering.
    pub id: String,
    /// Affected column name.
    pub column: String,
    /// Zero-based data row; `None` for column-level findings.
    pub row: Option<usize>,
    /// Row timestamp in ISO 8601 form, when a time axis exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Detector that raised the issue.
    #[serde(rename = "type")]
    pub kind: DetectorKind,
    /// Severity level.
    pub severity: Severity,
    /// Human-readable description.
    pub message: String,
    /// The offending raw cell value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_value: Option<String>,
    /// Outlier methods that flagged the reading (spike issues only).
    #[serde(rename = "method", default, skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<SpikeMethod>,
    /// Detector whose finding raised this issue's severity on merge.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub escalated_by: Option<DetectorKind>,
}

impl Issue {
    /// Create a new issue.
    pub fn new(
        kind: DetectorKind,
        severity: Severity,
        column: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: String::new(),
            column: column.into(),
            row: None,
            timestamp: None,
            kind,
            severity,
            message: message.into(),
            raw_value: None,
            methods: Vec::new(),
            escalated_by: None,
        }
    }

    /// Set the data row.
    pub fn at_row(mut self, row: usize) -> Self {
        self.row = Some(row);
        self
    }

    /// Set the row timestamp.
    pub fn with_timestamp(mut self, timestamp: Option<String>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Set the raw cell value.
    pub fn with_raw_value(mut self, raw: impl Into<String>) -> Self {
        self.raw_value = Some(raw.into());
        self
    }

    /// Set the spike methods.
    pub fn with_methods(mut self, methods: Vec<SpikeMethod>) -> Self {
        self.methods = methods;
        self
    }

    /// Check whether this is a column-level finding.
    pub fn is_column_level(&self) -> bool {
        self.row.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
        assert!(Severity::High < Severity::Critical);
        assert_eq!(Severity::ALL[0], Severity::Critical);
    }

    #[test]
    fn test_issue_serialization_shape() {
        let issue = Issue::new(
            DetectorKind::Spike,
            Severity::High,
            "AHU1_SAT",
            "reading 950 deviates from the column",
        )
        .at_row(42)
        .with_raw_value("950")
        .with_methods(vec![SpikeMethod::ZScore, SpikeMethod::Iqr]);

        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["type"], "spike");
        assert_eq!(json["severity"], "high");
        assert_eq!(json["row"], 42);
        assert_eq!(json["method"][1], "iqr");
        assert!(json.get("escalated_by").is_none());
        assert!(json.get("timestamp").is_none());

        let back: Issue = serde_json::from_value(json).unwrap();
        assert_eq!(back, issue);
    }

    #[test]
    fn test_column_level_issue_has_null_row() {
        let issue = Issue::new(DetectorKind::Null, Severity::Critical, "ZN2_T", "all null");
        let json = serde_json::to_value(&issue).unwrap();
        assert!(json["row"].is_null());
        assert!(json.get("method").is_none());
        assert!(issue.is_column_level());
    }

    #[test]
    fn test_severity_counts() {
        let mut counts = SeverityCounts::default();
        counts.add(Severity::High);
        counts.add(Severity::High);
        counts.add(Severity::Low);
        assert_eq!(counts.get(Severity::High), 2);
        assert_eq!(counts.total(), 3);
    }
}
