//! Validate command - validate an export and write a quality report.

use std::path::PathBuf;

use bmscheck::validation::result_path;
use bmscheck::{BmsCheck, CancellationToken, ValidationConfig};
use colored::Colorize;

pub fn run(
    file: PathBuf,
    config: Option<PathBuf>,
    vendor: Option<String>,
    output: Option<PathBuf>,
    json: bool,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    // Validate input file exists
    if !file.exists() {
        return Err(format!("File not found: {}", file.display()).into());
    }

    let mut options = match config {
        Some(ref path) => ValidationConfig::from_json_file(path)?,
        None => ValidationConfig::default(),
    };
    if let Some(v) = vendor {
        options = options.with_vendor(v);
    }

    // Ctrl-C stops the scan at the next window boundary
    let cancel = CancellationToken::new();
    let handler_token = cancel.clone();
    ctrlc::set_handler(move || handler_token.cancel())?;

    let check = BmsCheck::with_config(options)?.with_cancellation(cancel);

    if !json {
        println!(
            "{} {}",
            "Validating".cyan().bold(),
            file.display().to_string().white()
        );
    }

    let result = check.validate_path(&file)?;

    let report_path = output.unwrap_or_else(|| result_path(&file));
    result.save(&report_path)?;
    tracing::debug!(path = %report_path.display(), "saved quality report");

    if json {
        println!("{}", result.to_json_pretty()?);
        return Ok(());
    }

    super::print_report(&result, verbose);
    println!();
    println!(
        "{} {}",
        "Report saved to".green(),
        report_path.display().to_string().white()
    );

    Ok(())
}
