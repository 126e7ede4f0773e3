//! Detectors, aggregation and the validation engine.

mod aggregate;
mod cells;
mod engine;
mod issue;
mod junk;
mod naming;
mod null;
mod persistence;
mod range;
mod result;
mod spike;
pub mod stats;

pub use aggregate::{Aggregation, aggregate, quality_score};
pub use cells::{CellClass, CellClassifier, JunkReason, NullKind};
pub use engine::ValidationEngine;
pub use issue::{DetectorKind, Issue, Severity, SeverityCounts, SpikeMethod};
pub use junk::junk_issue;
pub use naming::{NamingOutcome, check_naming};
pub use null::{NullProfile, NullRun, NullTally};
pub use persistence::result_path;
pub use range::RangeCheck;
pub use result::{ResultMetadata, SkippedCheck, ValidationResult};
pub use spike::{SpikeDetector, SpikePlan};
