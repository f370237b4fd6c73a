//! Local-to-global significance conversion.
//!
//! For a maximum local significance `Z` the relevant excursion level is
//! `u = Z²`. At high levels the excursion set is almost surely empty or a
//! single blob, so `E[φ(A_u)]` approximates the probability that the
//! maximum of the field exceeds `u`: the global p-value.

use lee_common::advisory::{check_coefficients, check_p_value};
use lee_common::{Advisory, BatchResult, Error, Result};
use lee_config::{LeeConfig, SolverSettings};
use lee_math::{p_value_from_significance, significance_from_p_value};
use schemars::JsonSchema;
use serde::Serialize;

use crate::calibrate::{Calibration, CalibrationPoint};
use crate::euler::{expected_euler, CoefficientFit, Coefficients};

/// Global p-value for an observed `u = -2 log λ` under fitted coefficients.
///
/// Not clamped: values outside `[0, 1]` mean the asymptotic formula is being
/// used outside its range and are surfaced as advisories by the callers.
pub fn global_pvalue(u: f64, n1: f64, n2: f64) -> Result<f64> {
    expected_euler(u, n1, n2)
}

/// Result of a look-elsewhere correction.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct LeeCorrection {
    pub coefficients: Coefficients,
    /// Excursion level `u = Z²`.
    pub threshold: f64,
    pub local_significance: f64,
    /// One-sided `1 − Φ(Z)`.
    pub local_p_value: f64,
    pub global_p_value: f64,
    /// `−Φ⁻¹(p_global)`; NaN when the p-value is outside `[0, 1]`.
    pub global_significance: f64,
    /// `p_global / p_local`.
    pub trials_factor: f64,
    pub calibration: Calibration,
    pub solver: SolverDiagnostics,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub advisories: Vec<Advisory>,
}

/// Coefficient solve diagnostics carried on a correction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, JsonSchema)]
pub struct SolverDiagnostics {
    pub iterations: usize,
    pub residual: f64,
    pub converged: bool,
}

impl From<&CoefficientFit> for SolverDiagnostics {
    fn from(fit: &CoefficientFit) -> Self {
        SolverDiagnostics {
            iterations: fit.iterations,
            residual: fit.residual,
            converged: fit.converged,
        }
    }
}

impl LeeCorrection {
    pub fn has_advisories(&self) -> bool {
        !self.advisories.is_empty()
    }
}

/// A correction for one named channel.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct ChannelCorrection {
    pub channel: String,
    #[serde(flatten)]
    pub correction: LeeCorrection,
}

/// Runs corrections with fixed solver settings.
#[derive(Debug, Clone, Default)]
pub struct LeeCorrector {
    settings: SolverSettings,
    strict: bool,
}

impl LeeCorrector {
    pub fn new(settings: SolverSettings) -> Self {
        LeeCorrector {
            settings,
            strict: false,
        }
    }

    /// Corrector configured from a loaded configuration document.
    pub fn from_config(config: &LeeConfig) -> Self {
        LeeCorrector::new(config.solver).strict(config.report.strict)
    }

    /// In strict mode any advisory becomes [`Error::OutOfRangeResult`].
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn settings(&self) -> &SolverSettings {
        &self.settings
    }

    /// Fit the calibration and convert `max_local_sig` to a global result.
    pub fn correct(&self, max_local_sig: f64, calibration: &Calibration) -> Result<LeeCorrection> {
        check_significance(max_local_sig)?;
        let fit = calibration.fit(&self.settings)?;
        self.correct_fitted(max_local_sig, calibration, &fit)
    }

    /// Convert `max_local_sig` using coefficients already fitted from
    /// `calibration`.
    pub fn correct_fitted(
        &self,
        max_local_sig: f64,
        calibration: &Calibration,
        fit: &CoefficientFit,
    ) -> Result<LeeCorrection> {
        check_significance(max_local_sig)?;
        let correction = self.apply(max_local_sig, calibration, fit)?;
        self.enforce(correction)
    }

    /// Same as [`correct`](Self::correct) with the calibration given as scalars.
    pub fn correct_with(
        &self,
        max_local_sig: f64,
        u1: f64,
        u2: f64,
        phi1: f64,
        phi2: f64,
    ) -> Result<LeeCorrection> {
        let calibration = Calibration::new(
            CalibrationPoint::exact(u1, phi1),
            CalibrationPoint::exact(u2, phi2),
        );
        self.correct(max_local_sig, &calibration)
    }

    /// Correct several independent channels against one calibration.
    ///
    /// The calibration is fitted once; a channel with invalid input or a
    /// strict-mode advisory fails alone.
    pub fn correct_channels(
        &self,
        channels: &[(String, f64)],
        calibration: &Calibration,
    ) -> Result<BatchResult<ChannelCorrection>> {
        let fit = calibration.fit(&self.settings)?;
        Ok(self.correct_channels_fitted(channels, calibration, &fit))
    }

    /// Same as [`correct_channels`](Self::correct_channels) with a prior fit.
    pub fn correct_channels_fitted(
        &self,
        channels: &[(String, f64)],
        calibration: &Calibration,
        fit: &CoefficientFit,
    ) -> BatchResult<ChannelCorrection> {
        let mut batch = BatchResult::default();
        for (name, z) in channels {
            match self.correct_fitted(*z, calibration, fit) {
                Ok(correction) => batch.add_success(ChannelCorrection {
                    channel: name.clone(),
                    correction,
                }),
                Err(err) => batch.add_failure(name.clone(), &err),
            }
        }
        batch
    }

    fn apply(
        &self,
        z: f64,
        calibration: &Calibration,
        fit: &CoefficientFit,
    ) -> Result<LeeCorrection> {
        let u = z * z;
        let Coefficients { n1, n2 } = fit.coefficients;
        let global_p_value = global_pvalue(u, n1, n2)?;
        let local_p_value = p_value_from_significance(z);

        let advisories: Vec<Advisory> = check_coefficients(n1, n2)
            .into_iter()
            .chain(check_p_value(global_p_value))
            .collect();

        tracing::debug!(
            z,
            u,
            local_p_value,
            global_p_value,
            advisories = advisories.len(),
            "look-elsewhere correction"
        );

        Ok(LeeCorrection {
            coefficients: fit.coefficients,
            threshold: u,
            local_significance: z,
            local_p_value,
            global_p_value,
            global_significance: significance_from_p_value(global_p_value),
            trials_factor: global_p_value / local_p_value,
            calibration: *calibration,
            solver: SolverDiagnostics::from(fit),
            advisories,
        })
    }

    fn enforce(&self, correction: LeeCorrection) -> Result<LeeCorrection> {
        if self.strict && correction.has_advisories() {
            return Err(Error::OutOfRangeResult {
                advisories: correction.advisories,
            });
        }
        Ok(correction)
    }
}

fn check_significance(z: f64) -> Result<()> {
    if z.is_finite() && z >= 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidSignificance { z })
    }
}

/// Full correction with default solver settings and no strict mode.
///
/// Fits `(n1, n2)` from `(u1, phi1)` and `(u2, phi2)`, then evaluates the
/// global p-value at `u = max_local_sig²`.
pub fn do_lee_correction(
    max_local_sig: f64,
    u1: f64,
    u2: f64,
    phi1: f64,
    phi2: f64,
) -> Result<LeeCorrection> {
    LeeCorrector::default().correct_with(max_local_sig, u1, u2, phi1, phi2)
}
