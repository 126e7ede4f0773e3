//! Fuzz target for the export loader.
//!
//! This fuzzer tests that the loader:
//! 1. Never panics on malformed input
//! 2. Reports structural problems as errors, not crashes
//! 3. Behaves the same whether the stream size is declared or not

#![no_main]

use bmscheck::Loader;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Only process reasonable-sized inputs to avoid OOM
    if data.len() > 100_000 {
        return;
    }

    let loader = Loader::new();
    let declared = loader.load_reader(data, "fuzz.csv", Some(data.len() as u64));
    let measured = loader.load_reader(data, "fuzz.csv", None);
    assert_eq!(declared.is_ok(), measured.is_ok());
});
