//! Column role and physical type inference from names and sampled values.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::config::ResolvedConfig;
use crate::error::Result;
use crate::input::Dataset;
use crate::input::values::{parse_number, parse_reading, parse_status_word, parse_timestamp};
use crate::schema::{ColumnProfile, ColumnRole, PhysicalType};

// =============================================================================
// LAZY STATIC PATTERNS
// =============================================================================
// Unit tokens are matched against the raw header, keywords against the
// normalized snake_case form. Order matters: the first hit wins.

static UNIT_PATTERNS: Lazy<Vec<(Regex, PhysicalType)>> = Lazy::new(|| {
    [
        (r"°\s?[fc]|deg\s?[fc]|degrees?\s?[fc]", PhysicalType::Temperature),
        (r"%\s?rh|rh\s?%", PhysicalType::Humidity),
        (r"ppm", PhysicalType::Co2),
        (r"kpa|pa|psig?|in\s?wc|in\.?\s?w\.?c\.?|inh2o", PhysicalType::Pressure),
        (r"cfm|gpm|l/s", PhysicalType::Flow),
        (r"kwh|mwh", PhysicalType::Energy),
        (r"kw|mw", PhysicalType::Power),
        (r"pct", PhysicalType::Percent),
    ]
    .into_iter()
    .filter_map(|(unit, ty)| {
        Regex::new(&format!(r"(?i)(?:^|[^a-z0-9])({})(?:$|[^a-z0-9])", unit))
            .ok()
            .map(|re| (re, ty))
    })
    .collect()
});

static KEYWORD_PATTERNS: Lazy<Vec<(Regex, PhysicalType)>> = Lazy::new(|| {
    [
        (r"co2|carbon_dioxide", PhysicalType::Co2),
        (r"rh|humidity|humid|hum", PhysicalType::Humidity),
        (r"kwh|energy|consumption", PhysicalType::Energy),
        (r"kw|power|demand|watts", PhysicalType::Power),
        (r"flow|airflow|cfm|gpm|af", PhysicalType::Flow),
        (r"press|pressure|sp|dsp|static|dp", PhysicalType::Pressure),
        (
            r"pct|percent|pos|position|vlv|valve|dmpr|damper|spd|speed",
            PhysicalType::Percent,
        ),
        (
            r"status|sts|alarm|alm|enable|ena|occ|occupied|run|onoff|state",
            PhysicalType::BinaryStatus,
        ),
        (
            r"temp|temperature|tmp|t|sat|rat|mat|oat|dat|lat|swt|rwt|chwst|chwrt|hwst|hwrt",
            PhysicalType::Temperature,
        ),
    ]
    .into_iter()
    .filter_map(|(words, ty)| {
        Regex::new(&format!(r"(?:^|_)({})(?:_|$)", words))
            .ok()
            .map(|re| (re, ty))
    })
    .collect()
});

/// Classification of every column in a dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// One profile per column, in column order.
    pub columns: Vec<ColumnProfile>,
    /// Position of the first timestamp column.
    pub time_axis: Option<usize>,
}

impl Classification {
    /// Profiles of sensor columns.
    pub fn sensors(&self) -> impl Iterator<Item = &ColumnProfile> {
        self.columns.iter().filter(|c| c.is_sensor())
    }
}

/// Infers column roles from a sample of rows.
pub struct ColumnClassifier<'a> {
    config: &'a ResolvedConfig,
}

impl<'a> ColumnClassifier<'a> {
    /// Create a classifier.
    pub fn new(config: &'a ResolvedConfig) -> Self {
        Self { config }
    }

    /// Classify every column from the first `classifier_sample_rows` rows.
    pub fn classify(&self, dataset: &dyn Dataset) -> Result<Classification> {
        let sample = dataset.head(self.config.options.classifier_sample_rows)?;

        let columns: Vec<ColumnProfile> = dataset
            .headers()
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let values: Vec<&str> = sample
                    .iter()
                    .map(|row| row.get(i).map(|s| s.as_str()).unwrap_or(""))
                    .collect();
                self.classify_column(name, i, &values)
            })
            .collect();

        let time_axis = columns.iter().position(|c| c.is_timestamp());

        debug!(
            sampled = sample.len(),
            sensors = columns.iter().filter(|c| c.is_sensor()).count(),
            time_axis = ?time_axis,
            "columns classified"
        );

        Ok(Classification { columns, time_axis })
    }

    /// Classify one column from its sampled raw values.
    pub fn classify_column(&self, name: &str, position: usize, values: &[&str]) -> ColumnProfile {
        let mut profile = ColumnProfile::new(name, position);
        let (named_type, unit_hint) = infer_physical_type(name);
        profile.unit_hint = unit_hint;
        profile.naming = self
            .config
            .naming_rules()
            .iter()
            .find(|rule| rule.matches(name))
            .map(|rule| rule.vendor.clone());

        let allow_status = matches!(named_type, None | Some(PhysicalType::BinaryStatus));

        let mut nulls = 0usize;
        let mut candidates = 0usize;
        let mut numeric = 0usize;
        let mut timestamps = 0usize;
        let mut binary_only = true;
        let mut status_words = false;

        for raw in values {
            if self.config.is_null_token(raw) {
                nulls += 1;
                continue;
            }
            // Error markers say nothing about what the column normally holds.
            if self.config.matching_sentinel(raw.trim()).is_some() {
                continue;
            }
            candidates += 1;

            if parse_timestamp(raw).is_some() {
                timestamps += 1;
            }
            if let Some(v) = parse_reading(raw, allow_status) {
                numeric += 1;
                if v != 0.0 && v != 1.0 {
                    binary_only = false;
                }
                if parse_number(raw).is_none() && parse_status_word(raw).is_some() {
                    status_words = true;
                }
            }
        }

        profile.sampled = values.len();
        profile.sampled_nulls = nulls;

        if candidates == 0 {
            // Nothing but nulls: still a sensor series, so the null detector sees it.
            profile.role = ColumnRole::Sensor;
            profile.physical_type = named_type;
            return profile;
        }

        profile.numeric_ratio = numeric as f64 / candidates as f64;
        profile.timestamp_ratio = timestamps as f64 / candidates as f64;

        let options = &self.config.options;
        profile.role = if profile.timestamp_ratio >= options.timestamp_threshold {
            ColumnRole::Timestamp
        } else if profile.numeric_ratio >= options.sensor_threshold {
            ColumnRole::Sensor
        } else if profile.numeric_ratio <= 1.0 - options.sensor_threshold {
            ColumnRole::Identifier
        } else {
            ColumnRole::Unknown
        };

        if profile.role == ColumnRole::Sensor {
            profile.physical_type = match named_type {
                Some(ty) => Some(ty),
                None if status_words || (binary_only && numeric >= 2) => {
                    Some(PhysicalType::BinaryStatus)
                }
                None => None,
            };
        }

        profile
    }
}

/// Infer the physical quantity from a column name.
///
/// Returns the type and the unit token that decided it, if any.
pub fn infer_physical_type(name: &str) -> (Option<PhysicalType>, Option<String>) {
    for (pattern, ty) in UNIT_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(name) {
            let unit = caps.get(1).map(|m| m.as_str().to_string());
            return (Some(*ty), unit);
        }
    }
    if name.contains('%') {
        return (Some(PhysicalType::Percent), Some("%".to_string()));
    }

    let normalized = normalize_name(name);
    let ty = KEYWORD_PATTERNS
        .iter()
        .find(|(pattern, _)| pattern.is_match(&normalized))
        .map(|(_, ty)| *ty);
    (ty, None)
}

/// Lowercase snake_case form of a point name.
///
/// Splits on separators and lower-to-upper case changes, so `AHU1_SAT`,
/// `AHU1-SAT` and `ahu1Sat` normalize alike.
fn normalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;

    for c in name.chars() {
        if c.is_alphanumeric() {
            if c.is_uppercase() && prev_lower {
                out.push('_');
            }
            out.extend(c.to_lowercase());
            prev_lower = c.is_lowercase() || c.is_ascii_digit();
        } else {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            prev_lower = false;
        }
    }

    out.trim_end_matches('_').to_string()
}
