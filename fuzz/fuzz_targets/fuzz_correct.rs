//! Fuzz target for calibration fit and significance conversion.
//!
//! Arbitrary thresholds and calibration values must produce either a
//! correction or a typed error.

#![no_main]

use arbitrary::Arbitrary;
use lee_common::Error;
use lee_core::do_lee_correction;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    z: f64,
    u1: f64,
    u2: f64,
    phi1: f64,
    phi2: f64,
}

fuzz_target!(|input: Input| {
    match do_lee_correction(input.z, input.u1, input.u2, input.phi1, input.phi2) {
        Ok(correction) => {
            assert_eq!(correction.threshold, input.z * input.z);
            assert!(correction.coefficients.n1.is_finite());
            assert!(correction.coefficients.n2.is_finite());
        }
        Err(
            Error::InvalidSignificance { .. }
            | Error::InvalidThreshold { .. }
            | Error::DegenerateSystem { .. }
            | Error::NonConvergence { .. },
        ) => {}
        Err(other) => panic!("unexpected error kind: {other}"),
    }
});
