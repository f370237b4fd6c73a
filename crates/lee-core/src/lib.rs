//! Euler-characteristic look-elsewhere correction for two-dimensional searches.
//!
//! This library provides:
//! - The expected Euler characteristic model and coefficient fit
//! - The discrete Euler characteristic of thresholded grids
//! - Surfaces, excursion sets and calibration from background surfaces
//! - Local-to-global significance conversion
//! - Exit codes, output rendering and logging for the `lee2d` binary
//!
//! The binary entry point is in `main.rs`.

pub mod calibrate;
pub mod correct;
pub mod euler;
pub mod exit_codes;
pub mod logging;
pub mod output;
pub mod surface;

// Re-export test utilities for integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use calibrate::{measure_calibration, Calibration, CalibrationPoint};
pub use correct::{
    do_lee_correction, global_pvalue, ChannelCorrection, LeeCorrection, LeeCorrector,
    SolverDiagnostics,
};
pub use euler::{
    calculate_euler_characteristic, expected_euler, fit_coefficients, get_coefficients,
    CoefficientFit, Coefficients, EulerCounts, ExcursionSet,
};
pub use lee_common::{Advisory, Error, Result};
pub use surface::{Axis, Peak, Surface};
