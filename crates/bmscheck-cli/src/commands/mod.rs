//! CLI command implementations.

pub mod config;
pub mod summary;
pub mod validate;

use bmscheck::{Severity, ValidationResult};
use colored::{ColoredString, Colorize};

/// Issues listed per severity before the rest are summarized.
const ISSUES_PER_SEVERITY: usize = 5;

fn severity_label(severity: Severity) -> ColoredString {
    match severity {
        Severity::Critical => severity.label().red().bold(),
        Severity::High => severity.label().red(),
        Severity::Medium => severity.label().yellow(),
        Severity::Low => severity.label().blue(),
    }
}

fn score_label(score: f64) -> ColoredString {
    let text = format!("{:.2}", score);
    if score >= 90.0 {
        text.green()
    } else if score >= 70.0 {
        text.yellow()
    } else {
        text.red()
    }
}

/// Print a coloured report for a result.
pub(crate) fn print_report(result: &ValidationResult, verbose: bool) {
    let source = &result.metadata.source;

    println!(
        "Rows: {}  Columns: {}  Format: {}  Strategy: {}",
        source.row_count.to_string().white().bold(),
        source.column_count.to_string().white().bold(),
        source.format,
        result.metadata.strategy
    );

    if verbose {
        println!();
        println!("{}", "Columns:".yellow().bold());
        for col in &result.columns {
            println!(
                "  {:24} {:10} {}",
                col.name,
                col.role.label(),
                col.physical_type
                    .map(|t| t.to_string())
                    .unwrap_or_else(|| "-".to_string())
            );
        }
    }

    if let Some(ref vendor) = result.metadata.vendor {
        println!("Naming convention: {}", vendor.cyan());
    }
    if result.metadata.approximate {
        println!(
            "{} quantiles estimated from samples for {}",
            "Note:".yellow(),
            result.metadata.approximated_columns.join(", ")
        );
    }

    println!();
    println!(
        "Found {} issues ({} critical, {} high, {} medium, {} low)",
        result.totals.total().to_string().white().bold(),
        result.totals.critical.to_string().red().bold(),
        result.totals.high.to_string().red(),
        result.totals.medium.to_string().yellow(),
        result.totals.low.to_string().blue()
    );

    for severity in Severity::ALL {
        let count = result.totals.get(severity);
        if count == 0 {
            continue;
        }
        println!();
        println!("{} ({})", severity_label(severity), count);

        let limit = if verbose { usize::MAX } else { ISSUES_PER_SEVERITY };
        for issue in result.issues_with_severity(severity).take(limit) {
            let location = match issue.row {
                Some(row) => format!("{} row {}", issue.column, row),
                None => issue.column.clone(),
            };
            println!("  {} {}: {}", issue.id.dimmed(), location, issue.message);
        }
        if count > limit {
            println!("  {}", format!("... and {} more", count - limit).dimmed());
        }
    }

    if !result.metadata.skipped_checks.is_empty() {
        println!();
        println!("{}", "Skipped checks:".yellow().bold());
        for skipped in &result.metadata.skipped_checks {
            match skipped.column {
                Some(ref column) => {
                    println!("  {} {}: {}", skipped.detector, column, skipped.reason)
                }
                None => println!("  {}: {}", skipped.detector, skipped.reason),
            }
        }
    }

    println!();
    println!("Quality score: {} / 100", score_label(result.score).bold());
}
