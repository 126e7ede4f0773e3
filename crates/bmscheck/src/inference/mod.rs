//! Column inference: roles, physical types and naming conventions.

mod classifier;
mod naming;

pub use classifier::{Classification, ColumnClassifier, infer_physical_type};
pub use naming::{Casing, CompiledNamingRule, NamingRule};
