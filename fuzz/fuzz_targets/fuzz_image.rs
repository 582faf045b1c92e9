//! Fuzz target for program image parsing and listing.
//!
//! Feeds arbitrary text to the JSON image reader. Anything that parses must
//! also list and load without panicking.

#![no_main]

use libfuzzer_sys::fuzz_target;
use stack8::{listing, ControlUnit, ProgramImage};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(image) = ProgramImage::from_json(text) else {
        return;
    };

    let _ = listing(&image);
    if let Ok(mut cu) = ControlUnit::from_image(&image) {
        let _ = cu.run_for_ticks(1_000);
    }
});
