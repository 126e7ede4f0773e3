//! Fuzz target for timestamp and reading parsing.

#![no_main]

use bmscheck::input::values::{format_timestamp, parse_reading, parse_timestamp};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Some(ts) = parse_timestamp(s) {
            let _ = format_timestamp(&ts);
        }
        let _ = parse_reading(s, true);
    }
});
