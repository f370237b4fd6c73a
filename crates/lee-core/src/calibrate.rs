//! Calibration points measured from background surfaces.
//!
//! The coefficients are fitted from `E[φ(A_u)]` at two thresholds. In
//! practice that expectation is estimated by averaging the Euler
//! characteristic of excursion sets over surfaces generated under the
//! background-only hypothesis.

use lee_common::{Error, Result};
use lee_config::SolverSettings;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::euler::{fit_coefficients, CoefficientFit};
use crate::surface::Surface;

/// Expected Euler characteristic at one threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CalibrationPoint {
    pub threshold: f64,
    /// Mean Euler characteristic over the measured surfaces.
    pub euler: f64,
    /// Standard error of the mean (0 for a single surface).
    #[serde(default)]
    pub std_error: f64,
    #[serde(default = "one")]
    pub samples: usize,
}

fn one() -> usize {
    1
}

impl CalibrationPoint {
    /// A point supplied directly rather than measured.
    pub fn exact(threshold: f64, euler: f64) -> Self {
        CalibrationPoint {
            threshold,
            euler,
            std_error: 0.0,
            samples: 1,
        }
    }

    fn from_measurements(threshold: f64, values: &[i64]) -> Self {
        let n = values.len() as f64;
        let mean = values.iter().map(|&v| v as f64).sum::<f64>() / n;
        let std_error = if values.len() > 1 {
            let var = values
                .iter()
                .map(|&v| (v as f64 - mean).powi(2))
                .sum::<f64>()
                / (n - 1.0);
            (var / n).sqrt()
        } else {
            0.0
        };
        CalibrationPoint {
            threshold,
            euler: mean,
            std_error,
            samples: values.len(),
        }
    }
}

/// Two calibration points with distinct thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Calibration {
    pub first: CalibrationPoint,
    pub second: CalibrationPoint,
}

impl Calibration {
    pub fn new(first: CalibrationPoint, second: CalibrationPoint) -> Self {
        Calibration { first, second }
    }

    /// Fit the shape coefficients to these two points.
    pub fn fit(&self, settings: &SolverSettings) -> Result<CoefficientFit> {
        fit_coefficients(
            self.first.threshold,
            self.second.threshold,
            self.first.euler,
            self.second.euler,
            settings,
        )
    }
}

/// Average the Euler characteristic over `surfaces` at `u1` and `u2`.
pub fn measure_calibration(surfaces: &[Surface], u1: f64, u2: f64) -> Result<Calibration> {
    if surfaces.is_empty() {
        return Err(Error::InvalidGrid(
            "calibration needs at least one surface".to_string(),
        ));
    }

    let mut at_u1 = Vec::with_capacity(surfaces.len());
    let mut at_u2 = Vec::with_capacity(surfaces.len());
    for (i, surface) in surfaces.iter().enumerate() {
        let phi1 = surface.euler_characteristic_at(u1)?;
        let phi2 = surface.euler_characteristic_at(u2)?;
        tracing::trace!(surface = i, phi1, phi2, "measured euler characteristic");
        at_u1.push(phi1);
        at_u2.push(phi2);
    }

    let calibration = Calibration::new(
        CalibrationPoint::from_measurements(u1, &at_u1),
        CalibrationPoint::from_measurements(u2, &at_u2),
    );
    tracing::debug!(
        surfaces = surfaces.len(),
        phi1 = calibration.first.euler,
        phi2 = calibration.second.euler,
        "calibration measured"
    );
    Ok(calibration)
}
