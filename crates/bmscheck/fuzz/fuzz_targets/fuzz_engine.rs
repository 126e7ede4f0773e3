//! Fuzz target for the whole validation pipeline.
//!
//! Any input the loader accepts must validate without error: detector edge
//! cases never surface as failures.

#![no_main]

use arbitrary::Arbitrary;
use bmscheck::{BmsCheck, BmsCheckError, ValidationConfig};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input<'a> {
    data: &'a [u8],
    chunked: bool,
    chunk_rows: u8,
}

fuzz_target!(|input: Input<'_>| {
    if input.data.len() > 50_000 {
        return;
    }

    let config = ValidationConfig {
        large_file_threshold_mb: if input.chunked { 0 } else { 64 },
        chunk_rows: input.chunk_rows as usize + 1,
        ..Default::default()
    };
    let Ok(check) = BmsCheck::with_config(config) else {
        return;
    };

    match check.validate_reader(input.data, "fuzz.csv", None) {
        Ok(result) => assert!((0.0..=100.0).contains(&result.score)),
        Err(BmsCheckError::EmptyFile(_)) | Err(BmsCheckError::CorruptFile { .. }) => {}
        Err(other) => panic!("unexpected error: {}", other),
    }
});
