//! Column classification types.

mod profile;
mod types;

pub use profile::ColumnProfile;
pub use types::{ColumnRole, PhysicalType};
