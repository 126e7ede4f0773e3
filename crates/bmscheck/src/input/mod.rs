//! Loading BMS exports into scannable datasets.

mod chunked;
mod loader;
mod source;
pub mod values;

pub use chunked::ChunkedDataset;
pub use loader::{LoadedDataset, Loader};
pub use source::{
    DEFAULT_WINDOW_ROWS, Dataset, InMemoryDataset, LoadStrategy, RowWindow, SourceMetadata,
};
