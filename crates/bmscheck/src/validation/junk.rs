//! Junk detector: garbage strings and error sentinels in sensor columns.

use super::cells::JunkReason;
use super::issue::{DetectorKind, Issue, Severity};

/// Build the issue for a junk cell. Junk is always high severity.
pub fn junk_issue(
    column: &str,
    row: usize,
    raw: &str,
    reason: &JunkReason,
    timestamp: Option<String>,
) -> Issue {
    Issue::new(
        DetectorKind::Junk,
        Severity::High,
        column,
        format!("value '{}' {}", printable(raw), reason.describe()),
    )
    .at_row(row)
    .with_timestamp(timestamp)
    .with_raw_value(raw)
}

/// Escape control characters so messages stay on one line.
fn printable(raw: &str) -> String {
    raw.trim().chars().flat_map(char::escape_default).collect()
}
