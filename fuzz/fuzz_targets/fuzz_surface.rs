//! Fuzz target for surface documents and the excursion-set topology.
//!
//! Any surface that parses must yield consistent counts at every level.

#![no_main]

use lee_core::Surface;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(surface) = serde_json::from_slice::<Surface>(data) else {
        return;
    };

    let peak = surface.peak().value.max(0.0);
    for u in [0.0, peak / 2.0, peak] {
        if let Ok(counts) = surface.euler_counts_at(u) {
            assert_eq!(
                counts.vertices as i64 - counts.edges as i64 + counts.faces as i64,
                counts.euler
            );
            assert!(counts.edges <= 2 * counts.vertices);
        }
    }
});
