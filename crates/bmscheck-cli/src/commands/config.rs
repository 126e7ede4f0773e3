//! Config command - print or write the default configuration.

use std::path::PathBuf;

use bmscheck::ValidationConfig;
use colored::Colorize;

pub fn run(output: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let json = ValidationConfig::default().to_json_pretty()?;

    match output {
        Some(path) => {
            std::fs::write(&path, format!("{}\n", json))?;
            println!(
                "{} {}",
                "Configuration written to".green(),
                path.display().to_string().white()
            );
        }
        None => println!("{}", json),
    }

    Ok(())
}
