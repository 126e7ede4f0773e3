//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// bmscheck: data-quality validation for Building Management System exports
#[derive(Parser)]
#[command(name = "bmscheck")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate an export and write a quality report
    Validate {
        /// Path to the export (CSV/TSV)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// JSON configuration file (missing keys take defaults)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Vendor whose naming convention applies (default: auto-detect)
        #[arg(long)]
        vendor: Option<String>,

        /// Output path for the report (default: <file>.quality.json)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the full result as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Show a saved quality report
    Summary {
        /// Path to a report or to the export it was made from
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output totals as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print or write the default configuration
    Config {
        /// Write the configuration to this path instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}
