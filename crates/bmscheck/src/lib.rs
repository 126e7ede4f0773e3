//! bmscheck: data-quality validation for Building Management System exports.
//!
//! bmscheck reads a trend export (a timestamp column plus one column per
//! point), works out what each column holds, and reports null runs, junk
//! values, spikes, out-of-range readings and naming problems as a
//! severity-ranked list of issues with a 0-100 quality score.
//!
//! # Core Principles
//!
//! - **Read-only**: the input export is never modified
//! - **Deterministic**: the same file and configuration give the same result
//! - **Bounded memory**: large exports are scanned in windows, not loaded whole
//!
//! # Example
//!
//! ```no_run
//! use bmscheck::BmsCheck;
//!
//! let check = BmsCheck::new().unwrap();
//! let result = check.validate_path("trend.csv").unwrap();
//!
//! println!("Score: {:.2}", result.score);
//! println!("Issues: {}", result.issues.len());
//! ```

pub mod cancel;
pub mod config;
pub mod error;
pub mod inference;
pub mod input;
pub mod schema;
pub mod validation;

mod bmscheck;

pub use crate::bmscheck::BmsCheck;
pub use cancel::CancellationToken;
pub use config::{RangeBound, ResolvedConfig, ScoringConfig, TierValues, ValidationConfig};
pub use error::{BmsCheckError, Result};
pub use input::{Dataset, InMemoryDataset, LoadStrategy, Loader, SourceMetadata};
pub use schema::{ColumnProfile, ColumnRole, PhysicalType};
pub use validation::{
    DetectorKind, Issue, ResultMetadata, Severity, SeverityCounts, SkippedCheck, SpikeMethod,
    ValidationEngine, ValidationResult,
};
