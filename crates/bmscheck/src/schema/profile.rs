//! Column profile produced by the classifier.

use serde::{Deserialize, Serialize};

use super::types::{ColumnRole, PhysicalType};

/// Classification of a single column.
///
/// Derived once from the sampled rows of a dataset and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnProfile {
    /// Column name as it appears in the header.
    pub name: String,
    /// Zero-based position in the table.
    pub position: usize,
    /// Inferred role.
    pub role: ColumnRole,
    /// Inferred physical quantity (sensor columns only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub physical_type: Option<PhysicalType>,
    /// Unit token found in the column name (e.g. "degF", "ppm").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_hint: Option<String>,
    /// Vendor whose naming pattern matched the column name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub naming: Option<String>,
    /// Number of sampled rows.
    pub sampled: usize,
    /// Number of sampled values that were null.
    pub sampled_nulls: usize,
    /// Share of sampled non-null values that parsed as readings.
    pub numeric_ratio: f64,
    /// Share of sampled non-null values that parsed as timestamps.
    pub timestamp_ratio: f64,
}

impl ColumnProfile {
    /// Create an unclassified profile.
    pub fn new(name: impl Into<String>, position: usize) -> Self {
        Self {
            name: name.into(),
            position,
            role: ColumnRole::Unknown,
            physical_type: None,
            unit_hint: None,
            naming: None,
            sampled: 0,
            sampled_nulls: 0,
            numeric_ratio: 0.0,
            timestamp_ratio: 0.0,
        }
    }

    /// Set the role.
    pub fn with_role(mut self, role: ColumnRole) -> Self {
        self.role = role;
        self
    }

    /// Set the physical type.
    pub fn with_physical_type(mut self, physical_type: PhysicalType) -> Self {
        self.physical_type = Some(physical_type);
        self
    }

    /// Check if this column is a numeric sensor series.
    pub fn is_sensor(&self) -> bool {
        self.role == ColumnRole::Sensor
    }

    /// Check if this column is the time axis candidate.
    pub fn is_timestamp(&self) -> bool {
        self.role == ColumnRole::Timestamp
    }

    /// Get the share of sampled values that were null.
    pub fn sampled_null_fraction(&self) -> f64 {
        if self.sampled == 0 {
            0.0
        } else {
            self.sampled_nulls as f64 / self.sampled as f64
        }
    }
}
