//! Issue aggregation, ordering and scoring.

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};

use indexmap::IndexMap;

use crate::config::ScoringConfig;
use crate::schema::ColumnProfile;

use super::issue::{DetectorKind, Issue, Severity, SeverityCounts};

/// Merged, ordered issues with their counts and score.
#[derive(Debug, Clone)]
pub struct Aggregation {
    pub issues: Vec<Issue>,
    pub column_counts: IndexMap<String, SeverityCounts>,
    pub totals: SeverityCounts,
    pub score: f64,
}

/// Merge detector output, order it deterministically and score it.
pub fn aggregate(issues: Vec<Issue>, columns: &[ColumnProfile], scoring: &ScoringConfig) -> Aggregation {
    let mut issues = merge_spike_and_range(issues);

    let positions: HashMap<&str, usize> = columns
        .iter()
        .map(|c| (c.name.as_str(), c.position))
        .collect();
    issues.sort_by_key(|issue| {
        (
            Reverse(issue.severity),
            positions
                .get(issue.column.as_str())
                .copied()
                .unwrap_or(usize::MAX),
            issue.row.is_some(),
            issue.row,
            issue.kind,
        )
    });

    for (i, issue) in issues.iter_mut().enumerate() {
        issue.id = format!("iss_{:05}", i + 1);
    }

    let mut column_counts: IndexMap<String, SeverityCounts> = columns
        .iter()
        .map(|c| (c.name.clone(), SeverityCounts::default()))
        .collect();
    let mut totals = SeverityCounts::default();
    for issue in &issues {
        column_counts
            .entry(issue.column.clone())
            .or_default()
            .add(issue.severity);
        totals.add(issue.severity);
    }

    let score = quality_score(&totals, scoring);

    Aggregation {
        issues,
        column_counts,
        totals,
        score,
    }
}

/// Fold a range violation into the spike issue on the same cell.
///
/// The merged issue is critical, keeps the spike's methods and records the
/// range detector in `escalated_by`.
fn merge_spike_and_range(issues: Vec<Issue>) -> Vec<Issue> {
    let mut range_by_cell: BTreeMap<(String, usize), Issue> = BTreeMap::new();
    let mut rest = Vec::with_capacity(issues.len());

    for issue in issues {
        match (issue.kind, issue.row) {
            (DetectorKind::Range, Some(row)) => {
                range_by_cell.insert((issue.column.clone(), row), issue);
            }
            _ => rest.push(issue),
        }
    }

    for issue in rest.iter_mut() {
        let (DetectorKind::Spike, Some(row)) = (issue.kind, issue.row) else {
            continue;
        };
        if let Some(range) = range_by_cell.remove(&(issue.column.clone(), row)) {
            issue.severity = Severity::Critical;
            issue.escalated_by = Some(DetectorKind::Range);
            issue.message = format!("{}; {}", issue.message, range.message);
        }
    }

    rest.extend(range_by_cell.into_values());
    rest
}

/// Compute the 0-100 quality score from severity totals.
///
/// Each tier's penalty `weight * count` saturates exponentially toward the
/// tier's floor drop, so no tier alone can remove more than its floor.
pub fn quality_score(totals: &SeverityCounts, scoring: &ScoringConfig) -> f64 {
    let drop: f64 = Severity::ALL
        .iter()
        .map(|&severity| {
            let penalty = scoring.weights.get(severity) * totals.get(severity) as f64;
            let floor = scoring.floor_drop.get(severity);
            floor * (1.0 - (-penalty / floor).exp())
        })
        .sum();

    let score = (100.0 - drop).clamp(0.0, 100.0);
    (score * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnRole;
    use crate::validation::issue::SpikeMethod;

    fn columns() -> Vec<ColumnProfile> {
        vec![
            ColumnProfile::new("Timestamp", 0).with_role(ColumnRole::Timestamp),
            ColumnProfile::new("AHU1_SAT", 1).with_role(ColumnRole::Sensor),
            ColumnProfile::new("AHU1_RAT", 2).with_role(ColumnRole::Sensor),
        ]
    }

    fn counts(critical: usize, high: usize, medium: usize, low: usize) -> SeverityCounts {
        SeverityCounts {
            critical,
            high,
            medium,
            low,
        }
    }

    #[test]
    fn test_no_issues_scores_100() {
        let agg = aggregate(Vec::new(), &columns(), &ScoringConfig::default());
        assert_eq!(agg.score, 100.0);
        assert_eq!(agg.column_counts.len(), 3);
        assert_eq!(agg.totals.total(), 0);
    }

    #[test]
    fn test_single_critical_score() {
        let scoring = ScoringConfig::default();
        assert_eq!(quality_score(&counts(1, 0, 0, 0), &scoring), 95.2);
    }

    #[test]
    fn test_score_is_monotonic_and_bounded() {
        let scoring = ScoringConfig::default();
        let mut previous = 100.0;
        for n in 0..500 {
            let score = quality_score(&counts(n, n, n, n), &scoring);
            assert!(score <= previous);
            assert!((0.0..=100.0).contains(&score));
            previous = score;
        }
        assert_eq!(previous, 0.0);
    }

    #[test]
    fn test_spike_and_range_merge_into_one_critical() {
        let spike = Issue::new(DetectorKind::Spike, Severity::High, "AHU1_SAT", "spike")
            .at_row(10)
            .with_methods(vec![SpikeMethod::ZScore, SpikeMethod::Iqr]);
        let range = Issue::new(DetectorKind::Range, Severity::Critical, "AHU1_SAT", "range")
            .at_row(10);
        let other_range = Issue::new(DetectorKind::Range, Severity::High, "AHU1_SAT", "range")
            .at_row(11);

        let agg = aggregate(vec![range, spike, other_range], &columns(), &ScoringConfig::default());

        assert_eq!(agg.issues.len(), 2);
        let merged = &agg.issues[0];
        assert_eq!(merged.kind, DetectorKind::Spike);
        assert_eq!(merged.severity, Severity::Critical);
        assert_eq!(merged.escalated_by, Some(DetectorKind::Range));
        assert_eq!(merged.message, "spike; range");
        assert_eq!(merged.methods.len(), 2);
        assert_eq!(agg.issues[1].kind, DetectorKind::Range);
    }

    #[test]
    fn test_deterministic_order_and_ids() {
        let issues = vec![
            Issue::new(DetectorKind::Null, Severity::Low, "AHU1_RAT", "n").at_row(5),
            Issue::new(DetectorKind::Junk, Severity::High, "AHU1_RAT", "j").at_row(2),
            Issue::new(DetectorKind::Null, Severity::Low, "AHU1_SAT", "n").at_row(9),
            Issue::new(DetectorKind::Naming, Severity::Low, "AHU1_SAT", "name"),
            Issue::new(DetectorKind::Null, Severity::Low, "AHU1_SAT", "n").at_row(1),
        ];
        let agg = aggregate(issues, &columns(), &ScoringConfig::default());

        let order: Vec<(&str, Option<usize>)> = agg
            .issues
            .iter()
            .map(|i| (i.column.as_str(), i.row))
            .collect();
        assert_eq!(
            order,
            vec![
                ("AHU1_RAT", Some(2)),
                ("AHU1_SAT", None),
                ("AHU1_SAT", Some(1)),
                ("AHU1_SAT", Some(9)),
                ("AHU1_RAT", Some(5)),
            ]
        );
        assert_eq!(agg.issues[0].id, "iss_00001");
        assert_eq!(agg.issues[4].id, "iss_00005");
        assert_eq!(agg.column_counts["AHU1_SAT"].low, 3);
        assert_eq!(agg.totals.high, 1);
    }
}
