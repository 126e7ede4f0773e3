//! Summary command - show a saved quality report.

use std::path::PathBuf;

use bmscheck::ValidationResult;
use bmscheck::validation::result_path;
use colored::Colorize;

pub fn run(file: PathBuf, json: bool, verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let report_path = if is_report(&file) {
        file.clone()
    } else {
        result_path(&file)
    };

    if !report_path.exists() {
        return Err(format!(
            "No quality report found at {}. Run 'bmscheck validate {}' first.",
            report_path.display(),
            file.display()
        )
        .into());
    }

    let result = ValidationResult::load(&report_path)?;

    if json {
        let totals = serde_json::json!({
            "file": result.metadata.source.file,
            "score": result.score,
            "totals": result.totals,
            "columns": result.column_counts,
            "skipped_checks": result.metadata.skipped_checks.len(),
        });
        println!("{}", serde_json::to_string_pretty(&totals)?);
        return Ok(());
    }

    println!(
        "{} {}",
        "Report for".cyan().bold(),
        result.metadata.source.file.white()
    );
    println!(
        "Engine {}  Source hash {}",
        result.metadata.engine_version,
        short_hash(&result.metadata.source.hash).dimmed()
    );

    super::print_report(&result, verbose);

    Ok(())
}

fn is_report(path: &std::path::Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(".quality.json"))
}

fn short_hash(hash: &str) -> &str {
    hash.get(..12).unwrap_or(hash)
}
