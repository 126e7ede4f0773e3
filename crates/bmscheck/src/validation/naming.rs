//! Naming validator: column names against the vendor's point convention.

use tracing::debug;

use crate::config::ResolvedConfig;
use crate::inference::CompiledNamingRule;
use crate::schema::ColumnProfile;

use super::issue::{DetectorKind, Issue, Severity};

/// Result of the naming check.
#[derive(Debug, Clone, Default)]
pub struct NamingOutcome {
    /// One low issue per non-conforming column.
    pub issues: Vec<Issue>,
    /// Vendor whose convention was applied.
    pub vendor: Option<String>,
    /// Why the check did not run.
    pub skipped: Option<String>,
}

/// Check every non-timestamp column name against the active vendor.
///
/// The vendor is the configured one, or else the vendor whose convention the
/// most columns already follow (ties go to the lowest vendor key).
pub fn check_naming(columns: &[ColumnProfile], config: &ResolvedConfig) -> NamingOutcome {
    let names: Vec<&ColumnProfile> = columns.iter().filter(|c| !c.is_timestamp()).collect();

    let rule = match config.options.vendor.as_deref() {
        Some(vendor) => config.naming_rule(vendor),
        None => detect_vendor(&names, config.naming_rules()),
    };

    let Some(rule) = rule else {
        return NamingOutcome {
            skipped: Some("no column follows a known vendor naming convention".to_string()),
            ..Default::default()
        };
    };

    let issues = names
        .iter()
        .filter_map(|column| {
            let failures = rule.violations(&column.name);
            if failures.is_empty() {
                return None;
            }
            Some(Issue::new(
                DetectorKind::Naming,
                Severity::Low,
                &column.name,
                format!(
                    "name '{}' breaks the {} convention: {}",
                    column.name,
                    rule.vendor,
                    failures.join("; ")
                ),
            ))
        })
        .collect::<Vec<_>>();

    debug!(vendor = %rule.vendor, violations = issues.len(), "naming checked");

    NamingOutcome {
        issues,
        vendor: Some(rule.vendor.clone()),
        skipped: None,
    }
}

fn detect_vendor<'r>(
    columns: &[&ColumnProfile],
    rules: &'r [CompiledNamingRule],
) -> Option<&'r CompiledNamingRule> {
    let mut best: Option<(&CompiledNamingRule, usize)> = None;
    for rule in rules {
        let hits = columns.iter().filter(|c| rule.matches(&c.name)).count();
        if hits > 0 && best.is_none_or(|(_, n)| hits > n) {
            best = Some((rule, hits));
        }
    }
    best.map(|(rule, _)| rule)
}
