//! Validation configuration.
//!
//! [`ValidationConfig`] is the serializable option set a caller supplies.
//! [`ValidationConfig::resolve`] checks it and compiles it into an immutable
//! [`ResolvedConfig`] before any dataset is loaded, so configuration errors
//! are always reported up front.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{BmsCheckError, Result};
use crate::inference::{CompiledNamingRule, NamingRule};
use crate::schema::PhysicalType;
use crate::validation::Severity;

/// Physical bound for a sensor type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeBound {
    /// Lowest plausible reading.
    pub min: f64,
    /// Highest plausible reading.
    pub max: f64,
    /// Distance beyond the bound at which a violation becomes critical.
    #[serde(default)]
    pub hard_margin: f64,
}

impl RangeBound {
    /// Create a bound.
    pub fn new(min: f64, max: f64, hard_margin: f64) -> Self {
        Self {
            min,
            max,
            hard_margin,
        }
    }

    /// How far `value` lies outside the bound (0.0 when inside).
    pub fn excess(&self, value: f64) -> f64 {
        if value < self.min {
            self.min - value
        } else if value > self.max {
            value - self.max
        } else {
            0.0
        }
    }
}

/// One value per severity tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierValues {
    pub critical: f64,
    pub high: f64,
    pub medium: f64,
    pub low: f64,
}

impl TierValues {
    /// Get the value for a severity.
    pub fn get(&self, severity: Severity) -> f64 {
        match severity {
            Severity::Critical => self.critical,
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
        }
    }
}

/// Score penalty weights and per-tier floor drop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Penalty subtracted per issue of each severity.
    pub weights: TierValues,
    /// Maximum score a whole tier can remove.
    pub floor_drop: TierValues,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: TierValues {
                critical: 5.0,
                high: 2.0,
                medium: 0.5,
                low: 0.1,
            },
            floor_drop: TierValues {
                critical: 60.0,
                high: 30.0,
                medium: 15.0,
                low: 5.0,
            },
        }
    }
}

/// Options recognized by the validation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Declared sizes at or above this use the chunked strategy.
    pub large_file_threshold_mb: u64,
    /// Rows per scan window.
    pub chunk_rows: usize,
    /// Placeholder values treated as null (trimmed, case-insensitive).
    pub null_tokens: BTreeSet<String>,
    /// Regexes for communication-error sentinels.
    pub junk_sentinels: Vec<String>,
    /// Rows sampled for column classification.
    pub classifier_sample_rows: usize,
    /// Share of sampled values that must parse as timestamps.
    pub timestamp_threshold: f64,
    /// Share of sampled values that must parse as readings.
    pub sensor_threshold: f64,
    /// Null runs longer than this escalate to medium.
    pub null_run_medium: usize,
    /// Null runs longer than this escalate to high.
    pub null_run_high: usize,
    /// Centred window used for local null density.
    pub null_window_rows: usize,
    /// Local null density escalating to medium.
    pub null_window_fraction: f64,
    /// Column null fraction escalating to medium.
    pub null_fraction_medium: f64,
    /// Column null fraction escalating to high.
    pub null_fraction_high: f64,
    /// Z-Score threshold.
    pub z_threshold: f64,
    /// IQR fence multiplier.
    pub iqr_k: f64,
    /// Modified Z-Score threshold.
    pub mz_threshold: f64,
    /// Minimum readings before spike detection runs.
    pub min_spike_points: usize,
    /// Trailing window for the rolling Z-Score.
    pub zscore_window: usize,
    /// Column size above which the rolling Z-Score replaces the global one.
    pub zscore_rolling_above: usize,
    /// Maximum plausible change per minute, by sensor type.
    pub rate_of_change_max_by_type: BTreeMap<PhysicalType, f64>,
    /// Row pairs farther apart than this are not rate-checked.
    pub max_gap_seconds: i64,
    /// Physical bounds, by sensor type.
    pub range_bounds_by_type: BTreeMap<PhysicalType, RangeBound>,
    /// Naming conventions, by vendor key.
    pub vendor_naming_rules: BTreeMap<String, NamingRule>,
    /// Vendor whose naming rules apply (None = auto-detect).
    pub vendor: Option<String>,
    /// Reservoir capacity for quantile estimates.
    pub quantile_sample_size: usize,
    /// Score weights.
    pub scoring: ScoringConfig,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        let null_tokens = ["", "N/A", "NA", "NULL", "#N/A", "-9999", "nan", "None", "--"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let junk_sentinels = [
            r"^[+-]?9{5,}(\.0+)?$",
            r"^[+-]?8{4,}(\.0+)?$",
            r"(?i)^err(or)?\b",
            r"(?i)^(fault|offline|comm(\s*fail(ure)?)?|no\s*comm|timeout|unreliable)$",
            r"^\?+$",
            r"^#+$",
            r"(?i)^#(value|ref|div/0|num|name)[!?]?$",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        let rate_of_change_max_by_type = BTreeMap::from([
            (PhysicalType::Temperature, 5.0),
            (PhysicalType::Humidity, 10.0),
            (PhysicalType::Pressure, 50.0),
            (PhysicalType::Co2, 500.0),
            (PhysicalType::Percent, 100.0),
        ]);

        let range_bounds_by_type = BTreeMap::from([
            (PhysicalType::Temperature, RangeBound::new(-40.0, 250.0, 60.0)),
            (PhysicalType::Humidity, RangeBound::new(0.0, 100.0, 5.0)),
            (PhysicalType::Pressure, RangeBound::new(-50.0, 5000.0, 500.0)),
            (PhysicalType::Co2, RangeBound::new(0.0, 5000.0, 5000.0)),
            (PhysicalType::Percent, RangeBound::new(0.0, 100.0, 10.0)),
            (PhysicalType::BinaryStatus, RangeBound::new(0.0, 1.0, 0.0)),
        ]);

        Self {
            large_file_threshold_mb: 64,
            chunk_rows: 10_000,
            null_tokens,
            junk_sentinels,
            classifier_sample_rows: 1_000,
            timestamp_threshold: 0.9,
            sensor_threshold: 0.8,
            null_run_medium: 3,
            null_run_high: 12,
            null_window_rows: 60,
            null_window_fraction: 0.5,
            null_fraction_medium: 0.1,
            null_fraction_high: 0.5,
            z_threshold: 3.0,
            iqr_k: 1.5,
            mz_threshold: 3.5,
            min_spike_points: 10,
            zscore_window: 1_000,
            zscore_rolling_above: 100_000,
            rate_of_change_max_by_type,
            max_gap_seconds: 3_600,
            range_bounds_by_type,
            vendor_naming_rules: NamingRule::builtin(),
            vendor: None,
            quantile_sample_size: 200_000,
            scoring: ScoringConfig::default(),
        }
    }
}

impl ValidationConfig {
    /// Load a configuration from a JSON file. Missing keys take defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| BmsCheckError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&text).map_err(|e| {
            BmsCheckError::Config(format!("Failed to parse '{}': {}", path.display(), e))
        })
    }

    /// Serialize as pretty JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Set the vendor whose naming rules apply.
    pub fn with_vendor(mut self, vendor: impl Into<String>) -> Self {
        self.vendor = Some(vendor.into());
        self
    }

    /// Check the configuration and compile it for a run.
    pub fn resolve(&self) -> Result<ResolvedConfig> {
        self.check()?;

        let sentinels = self
            .junk_sentinels
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| {
                    BmsCheckError::Config(format!("invalid junk sentinel '{}': {}", p, e))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let naming_rules = self
            .vendor_naming_rules
            .iter()
            .map(|(vendor, rule)| CompiledNamingRule::compile(vendor, rule))
            .collect::<Result<Vec<_>>>()?;

        let null_tokens = self
            .null_tokens
            .iter()
            .map(|t| t.trim().to_lowercase())
            .collect();

        debug!(
            sentinels = sentinels.len(),
            vendors = naming_rules.len(),
            "configuration resolved"
        );

        Ok(ResolvedConfig {
            options: self.clone(),
            null_tokens,
            sentinels,
            naming_rules,
        })
    }

    fn check(&self) -> Result<()> {
        ensure(self.chunk_rows > 0, "chunk_rows must be positive")?;
        ensure(
            self.classifier_sample_rows > 0,
            "classifier_sample_rows must be positive",
        )?;
        ensure(
            in_unit_interval(self.timestamp_threshold),
            "timestamp_threshold must be in (0, 1]",
        )?;
        ensure(
            self.sensor_threshold > 0.5 && self.sensor_threshold <= 1.0,
            "sensor_threshold must be in (0.5, 1]",
        )?;
        ensure(self.null_run_medium >= 1, "null_run_medium must be at least 1")?;
        ensure(
            self.null_run_high >= self.null_run_medium,
            "null_run_high must not be below null_run_medium",
        )?;
        ensure(self.null_window_rows >= 1, "null_window_rows must be at least 1")?;
        ensure(
            in_unit_interval(self.null_window_fraction),
            "null_window_fraction must be in (0, 1]",
        )?;
        ensure(
            in_unit_interval(self.null_fraction_medium)
                && in_unit_interval(self.null_fraction_high)
                && self.null_fraction_medium <= self.null_fraction_high,
            "null fractions must be in (0, 1] with medium <= high",
        )?;
        ensure(positive(self.z_threshold), "z_threshold must be positive")?;
        ensure(positive(self.iqr_k), "iqr_k must be positive")?;
        ensure(positive(self.mz_threshold), "mz_threshold must be positive")?;
        ensure(self.min_spike_points >= 3, "min_spike_points must be at least 3")?;
        ensure(self.zscore_window >= 2, "zscore_window must be at least 2")?;
        ensure(self.max_gap_seconds > 0, "max_gap_seconds must be positive")?;
        ensure(
            self.quantile_sample_size >= 100,
            "quantile_sample_size must be at least 100",
        )?;

        for (ty, rate) in &self.rate_of_change_max_by_type {
            ensure(
                positive(*rate),
                &format!("rate_of_change_max_by_type.{} must be positive", ty),
            )?;
        }

        for (ty, bound) in &self.range_bounds_by_type {
            ensure(
                bound.min.is_finite() && bound.max.is_finite() && bound.min < bound.max,
                &format!("range_bounds_by_type.{} must have finite min < max", ty),
            )?;
            ensure(
                bound.hard_margin.is_finite() && bound.hard_margin >= 0.0,
                &format!("range_bounds_by_type.{} hard_margin must be >= 0", ty),
            )?;
        }

        for severity in Severity::ALL {
            let weight = self.scoring.weights.get(severity);
            let floor = self.scoring.floor_drop.get(severity);
            ensure(
                weight.is_finite() && weight >= 0.0,
                &format!("scoring weight for {} must be >= 0", severity.key()),
            )?;
            ensure(
                positive(floor),
                &format!("scoring floor_drop for {} must be positive", severity.key()),
            )?;
        }

        if let Some(ref vendor) = self.vendor {
            ensure(
                self.vendor_naming_rules.contains_key(vendor),
                &format!("no naming rules configured for vendor '{}'", vendor),
            )?;
        }

        Ok(())
    }
}

fn ensure(condition: bool, message: &str) -> Result<()> {
    if condition {
        Ok(())
    } else {
        Err(BmsCheckError::Config(message.to_string()))
    }
}

fn positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn in_unit_interval(value: f64) -> bool {
    value > 0.0 && value <= 1.0
}

/// Checked, compiled configuration for one validation run.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// The options this was resolved from.
    pub options: ValidationConfig,
    /// Lowercased, trimmed null tokens.
    null_tokens: HashSet<String>,
    /// Compiled sentinel patterns.
    sentinels: Vec<Regex>,
    /// Compiled naming rules, sorted by vendor key.
    naming_rules: Vec<CompiledNamingRule>,
}

impl ResolvedConfig {
    /// Check whether a raw cell is a configured null placeholder.
    pub fn is_null_token(&self, raw: &str) -> bool {
        let trimmed = raw.trim();
        trimmed.is_empty() || self.null_tokens.contains(&trimmed.to_lowercase())
    }

    /// Find the first sentinel pattern matching a trimmed value.
    pub fn matching_sentinel(&self, trimmed: &str) -> Option<&Regex> {
        self.sentinels.iter().find(|re| re.is_match(trimmed))
    }

    /// Compiled naming rules in vendor-key order.
    pub fn naming_rules(&self) -> &[CompiledNamingRule] {
        &self.naming_rules
    }

    /// Look up a vendor's compiled naming rule.
    pub fn naming_rule(&self, vendor: &str) -> Option<&CompiledNamingRule> {
        self.naming_rules.iter().find(|r| r.vendor == vendor)
    }

    /// Declared size at which the chunked strategy takes over.
    pub fn large_file_threshold_bytes(&self) -> u64 {
        self.options.large_file_threshold_mb.saturating_mul(1024 * 1024)
    }

    /// Rate-of-Change ceiling for a sensor type, in units per minute.
    pub fn max_rate(&self, ty: PhysicalType) -> Option<f64> {
        self.options.rate_of_change_max_by_type.get(&ty).copied()
    }

    /// Physical bound for a sensor type.
    pub fn range_bound(&self, ty: PhysicalType) -> Option<RangeBound> {
        self.options.range_bounds_by_type.get(&ty).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_resolves() {
        let resolved = ValidationConfig::default().resolve().unwrap();
        assert!(resolved.is_null_token("-9999"));
        assert!(resolved.is_null_token("  n/a "));
        assert!(resolved.is_null_token("   "));
        assert!(!resolved.is_null_token("ERR#12"));
        assert!(resolved.matching_sentinel("ERR#12").is_some());
        assert!(resolved.matching_sentinel("999999").is_some());
        assert!(resolved.matching_sentinel("72.5").is_none());
        assert!(resolved.naming_rule("niagara").is_some());
    }

    #[test]
    fn test_rejects_unknown_vendor() {
        let config = ValidationConfig::default().with_vendor("acme");
        let err = config.resolve().unwrap_err();
        assert!(matches!(err, BmsCheckError::Config(ref m) if m.contains("acme")));
    }

    #[test]
    fn test_rejects_invalid_thresholds() {
        let config = ValidationConfig {
            z_threshold: -1.0,
            ..Default::default()
        };
        assert!(matches!(config.resolve(), Err(BmsCheckError::Config(_))));

        let config = ValidationConfig {
            iqr_k: f64::NAN,
            ..Default::default()
        };
        assert!(matches!(config.resolve(), Err(BmsCheckError::Config(_))));

        let mut config = ValidationConfig::default();
        config
            .range_bounds_by_type
            .insert(PhysicalType::Humidity, RangeBound::new(100.0, 0.0, 0.0));
        assert!(matches!(config.resolve(), Err(BmsCheckError::Config(_))));
    }

    #[test]
    fn test_rejects_bad_sentinel_regex() {
        let config = ValidationConfig {
            junk_sentinels: vec!["([unclosed".to_string()],
            ..Default::default()
        };
        assert!(matches!(config.resolve(), Err(BmsCheckError::Config(_))));
    }

    #[test]
    fn test_json_round_trip_keeps_defaults_for_missing_keys() {
        let config: ValidationConfig =
            serde_json::from_str(r#"{"z_threshold": 4.0, "vendor": "metasys"}"#).unwrap();
        assert_eq!(config.z_threshold, 4.0);
        assert_eq!(config.vendor.as_deref(), Some("metasys"));
        assert_eq!(config.iqr_k, 1.5);
        assert!(config.resolve().is_ok());

        let json = ValidationConfig::default().to_json_pretty().unwrap();
        assert!(json.contains("\"temperature\""));
        let back: ValidationConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ValidationConfig::default());
    }

    #[test]
    fn test_range_bound_excess() {
        let bound = RangeBound::new(0.0, 100.0, 5.0);
        assert_eq!(bound.excess(50.0), 0.0);
        assert_eq!(bound.excess(-3.0), 3.0);
        assert_eq!(bound.excess(110.0), 10.0);
    }
}
