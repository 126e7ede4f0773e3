//! Core type definitions for column classification.

use serde::{Deserialize, Serialize};

/// Inferred role of a column in a BMS export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    /// Time axis of the export.
    Timestamp,
    /// Numeric point/sensor series.
    Sensor,
    /// Text identifiers (point names, device ids, status labels).
    Identifier,
    /// Mixed content that is neither clearly numeric nor clearly text.
    Unknown,
}

impl ColumnRole {
    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            ColumnRole::Timestamp => "Timestamp",
            ColumnRole::Sensor => "Sensor",
            ColumnRole::Identifier => "Identifier",
            ColumnRole::Unknown => "Unknown",
        }
    }
}

impl Default for ColumnRole {
    fn default() -> Self {
        ColumnRole::Unknown
    }
}

/// Physical quantity measured by a sensor column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhysicalType {
    /// Air, water or surface temperature.
    Temperature,
    /// Relative humidity.
    Humidity,
    /// Static, differential or line pressure.
    Pressure,
    /// CO2 concentration.
    Co2,
    /// Air or water flow.
    Flow,
    /// Instantaneous electrical power.
    Power,
    /// Accumulated energy.
    Energy,
    /// Valve/damper position, fan speed and other 0-100 commands.
    Percent,
    /// On/off status or command.
    BinaryStatus,
}

impl PhysicalType {
    /// All physical types, in declaration order.
    pub const ALL: [PhysicalType; 9] = [
        PhysicalType::Temperature,
        PhysicalType::Humidity,
        PhysicalType::Pressure,
        PhysicalType::Co2,
        PhysicalType::Flow,
        PhysicalType::Power,
        PhysicalType::Energy,
        PhysicalType::Percent,
        PhysicalType::BinaryStatus,
    ];

    /// Get the snake_case key used in configuration maps.
    pub fn key(&self) -> &'static str {
        match self {
            PhysicalType::Temperature => "temperature",
            PhysicalType::Humidity => "humidity",
            PhysicalType::Pressure => "pressure",
            PhysicalType::Co2 => "co2",
            PhysicalType::Flow => "flow",
            PhysicalType::Power => "power",
            PhysicalType::Energy => "energy",
            PhysicalType::Percent => "percent",
            PhysicalType::BinaryStatus => "binary_status",
        }
    }
}

impl std::fmt::Display for PhysicalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}
