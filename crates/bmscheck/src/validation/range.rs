//! Range validator: readings outside physical bounds.

use crate::config::RangeBound;
use crate::schema::PhysicalType;

use super::issue::{DetectorKind, Issue, Severity};

/// Bound check for one sensor column.
#[derive(Debug, Clone, Copy)]
pub struct RangeCheck {
    physical_type: PhysicalType,
    bound: RangeBound,
}

impl RangeCheck {
    /// Create a check for a typed column.
    pub fn new(physical_type: PhysicalType, bound: RangeBound) -> Self {
        Self {
            physical_type,
            bound,
        }
    }

    /// Check a reading; beyond the hard margin is critical, otherwise high.
    pub fn check(
        &self,
        column: &str,
        row: usize,
        value: f64,
        raw: &str,
        timestamp: Option<String>,
    ) -> Option<Issue> {
        let excess = self.bound.excess(value);
        if excess <= 0.0 {
            return None;
        }

        let severity = if excess > self.bound.hard_margin {
            Severity::Critical
        } else {
            Severity::High
        };

        Some(
            Issue::new(
                DetectorKind::Range,
                severity,
                column,
                format!(
                    "{} reading {} outside [{}, {}]",
                    self.physical_type.key(),
                    value,
                    self.bound.min,
                    self.bound.max
                ),
            )
            .at_row(row)
            .with_timestamp(timestamp)
            .with_raw_value(raw),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn humidity() -> RangeCheck {
        RangeCheck::new(PhysicalType::Humidity, RangeBound::new(0.0, 100.0, 5.0))
    }

    #[test]
    fn test_inside_bounds_passes() {
        assert!(humidity().check("RH", 0, 45.0, "45", None).is_none());
        assert!(humidity().check("RH", 0, 100.0, "100", None).is_none());
    }

    #[test]
    fn test_soft_and_hard_violations() {
        let soft = humidity().check("RH", 3, 103.0, "103", None).unwrap();
        assert_eq!(soft.severity, Severity::High);

        let hard = humidity().check("RH", 4, 130.0, "130", None).unwrap();
        assert_eq!(hard.severity, Severity::Critical);
        assert!(hard.message.contains("humidity reading 130 outside [0, 100]"));

        let below = humidity().check("RH", 5, -20.0, "-20", None).unwrap();
        assert_eq!(below.severity, Severity::Critical);
    }
}
