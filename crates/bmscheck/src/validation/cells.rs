//! Per-cell classification shared by the null, junk, spike and range checks.

use crate::config::ResolvedConfig;
use crate::input::values::parse_reading;
use crate::schema::{ColumnProfile, PhysicalType};

/// Why a cell counts as null.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullKind {
    /// Absent, empty or whitespace-only.
    Empty,
    /// A configured placeholder token such as `N/A`.
    Placeholder,
}

/// Why a non-null sensor cell is junk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JunkReason {
    ControlCharacters,
    EncodingArtifact,
    /// Matched the sentinel pattern carried here.
    Sentinel(String),
    Unparseable,
}

impl JunkReason {
    /// Describe the reason for an issue message.
    pub fn describe(&self) -> String {
        match self {
            JunkReason::ControlCharacters => "contains control characters".to_string(),
            JunkReason::EncodingArtifact => "contains encoding artifacts".to_string(),
            JunkReason::Sentinel(pattern) => {
                format!("matches communication-error sentinel {}", pattern)
            }
            JunkReason::Unparseable => "is not a numeric reading".to_string(),
        }
    }
}

/// Outcome of classifying one raw cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellClass {
    Null(NullKind),
    Junk(JunkReason),
    Reading(f64),
    /// Non-null content of a non-sensor column.
    Text,
}

/// Classifies raw cells of one column.
///
/// Null checks always run first, so a cell is never both null and junk.
#[derive(Debug, Clone, Copy)]
pub struct CellClassifier<'a> {
    config: &'a ResolvedConfig,
    numeric: bool,
    allow_status: bool,
}

impl<'a> CellClassifier<'a> {
    /// Create a classifier for a column.
    pub fn new(config: &'a ResolvedConfig, profile: &ColumnProfile) -> Self {
        Self {
            config,
            numeric: profile.is_sensor(),
            allow_status: matches!(
                profile.physical_type,
                None | Some(PhysicalType::BinaryStatus)
            ),
        }
    }

    /// Classify a raw cell.
    pub fn classify(&self, raw: &str) -> CellClass {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return CellClass::Null(NullKind::Empty);
        }
        if self.config.is_null_token(trimmed) {
            return CellClass::Null(NullKind::Placeholder);
        }
        if !self.numeric {
            return CellClass::Text;
        }

        if trimmed.chars().any(|c| c.is_control()) {
            return CellClass::Junk(JunkReason::ControlCharacters);
        }
        if has_encoding_artifact(trimmed) {
            return CellClass::Junk(JunkReason::EncodingArtifact);
        }
        if let Some(re) = self.config.matching_sentinel(trimmed) {
            return CellClass::Junk(JunkReason::Sentinel(re.as_str().to_string()));
        }

        match parse_reading(trimmed, self.allow_status) {
            Some(value) => CellClass::Reading(value),
            None => CellClass::Junk(JunkReason::Unparseable),
        }
    }
}

/// Replacement characters and UTF-8-read-as-Latin-1 mojibake.
fn has_encoding_artifact(s: &str) -> bool {
    s.contains('\u{fffd}')
        || s.contains('\u{feff}')
        || s.chars()
            .zip(s.chars().skip(1))
            .any(|(a, b)| matches!(a, 'Ã' | 'Â') && ('\u{80}'..='\u{bf}').contains(&b))
}
