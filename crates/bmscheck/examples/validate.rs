//! Example: Validate a BMS trend export with bmscheck.
//!
//! Usage:
//!   cargo run --example validate -- <file_path>
//!
//! Example:
//!   cargo run --example validate -- exports/ahu1_trend.csv

use std::env;
use std::path::Path;

use bmscheck::{BmsCheck, Severity};

fn main() -> bmscheck::Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: cargo run --example validate -- <file_path>");
        eprintln!("\nExample:");
        eprintln!("  cargo run --example validate -- exports/ahu1_trend.csv");
        std::process::exit(1);
    }

    let file_path = &args[1];
    let path = Path::new(file_path);

    if !path.exists() {
        eprintln!("Error: File not found: {}", file_path);
        std::process::exit(1);
    }

    let separator = "=".repeat(80);
    println!("{}", separator);
    println!("bmscheck Validation: {}", file_path);
    println!("{}", separator);
    println!();

    let result = BmsCheck::new()?.validate_path(path)?;

    println!("## Source Metadata");
    println!("  File: {}", result.metadata.source.file);
    println!("  Format: {}", result.metadata.source.format);
    println!("  Rows: {}", result.metadata.source.row_count);
    println!("  Columns: {}", result.metadata.source.column_count);
    println!("  Strategy: {}", result.metadata.strategy);
    println!();

    println!("## Columns ({})", result.columns.len());
    println!();
    for col in &result.columns {
        println!(
            "  {:24} {:12} {:14} naming={}",
            col.name,
            col.role.label(),
            col.physical_type
                .map(|t| t.to_string())
                .unwrap_or_else(|| "-".to_string()),
            col.naming.as_deref().unwrap_or("-")
        );
    }
    println!();

    println!("## Issues ({} total)", result.issues.len());
    println!();
    for severity in Severity::ALL {
        let issues: Vec<_> = result.issues_with_severity(severity).collect();
        if issues.is_empty() {
            continue;
        }
        println!("### {} ({}):", severity.label(), issues.len());
        for issue in issues.iter().take(20) {
            let row = issue
                .row
                .map(|r| format!("row {}", r))
                .unwrap_or_else(|| "column".to_string());
            println!("  [{}] {} {} - {}", issue.column, issue.kind, row, issue.message);
        }
        if issues.len() > 20 {
            println!("  ... and {} more", issues.len() - 20);
        }
        println!();
    }

    if !result.metadata.skipped_checks.is_empty() {
        println!("## Skipped Checks");
        for skipped in &result.metadata.skipped_checks {
            println!(
                "  {} {}: {}",
                skipped.column.as_deref().unwrap_or("*"),
                skipped.detector,
                skipped.reason
            );
        }
        println!();
    }

    println!("## Summary");
    println!("  Quality Score: {:.2}", result.score);
    println!(
        "  Critical: {}  High: {}  Medium: {}  Low: {}",
        result.totals.critical, result.totals.high, result.totals.medium, result.totals.low
    );
    println!();

    println!("{}", separator);

    Ok(())
}
