//! Fuzz target for config.json parsing and validation.
//!
//! Arbitrary input must produce a config or a `ValidationError`, never a
//! panic.

#![no_main]

use lee_config::{validate_config, LeeConfig};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(config) = LeeConfig::from_json(text) {
        let _ = validate_config(&config);
    }
});
