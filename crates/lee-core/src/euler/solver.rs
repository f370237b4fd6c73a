//! Fit the shape coefficients `(n1, n2)` from two calibration points.
//!
//! Given Euler characteristics `phi1`, `phi2` observed (or averaged over
//! background toys) at thresholds `u1 != u2`, solve
//!
//! ```text
//! expected_euler(u1, n1, n2) = phi1
//! expected_euler(u2, n1, n2) = phi2
//! ```
//!
//! with a damped Newton iteration started from the configured initial guess.
//!
//! Each equation is multiplied by `exp(u_i/2)` so that it reads
//! `n1 + n2·√u_i = c_i`, then divided by `max(1, |c_i|)`. The tolerance is
//! therefore relative, independent of how small `exp(−u/2)` gets at high
//! thresholds, and the Jacobian is exact.

use lee_common::advisory::check_coefficients;
use lee_common::{Advisory, Error, Result};
use lee_config::SolverSettings;
use lee_math::{chi2_survival_1dof, solve_2x2_with_jacobian, RootError};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::model::{check_threshold, expected_euler, Coefficients};

/// Fitted coefficients plus solver diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CoefficientFit {
    pub coefficients: Coefficients,
    /// Newton steps taken.
    pub iterations: usize,
    /// Max-norm of the weighted residual
    /// `exp(u_i/2)·(expected_euler(u_i) − phi_i) / max(1, |c_i|)` at the solution.
    pub residual: f64,
    pub converged: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub advisories: Vec<Advisory>,
}

/// Fit `(n1, n2)` with default solver settings.
pub fn get_coefficients(u1: f64, u2: f64, phi1: f64, phi2: f64) -> Result<Coefficients> {
    fit_coefficients(u1, u2, phi1, phi2, &SolverSettings::default()).map(|fit| fit.coefficients)
}

/// Fit `(n1, n2)` and report iterations, residual and advisories.
pub fn fit_coefficients(
    u1: f64,
    u2: f64,
    phi1: f64,
    phi2: f64,
    settings: &SolverSettings,
) -> Result<CoefficientFit> {
    check_threshold(u1)?;
    check_threshold(u2)?;
    if u1 == u2 {
        return Err(Error::DegenerateSystem { u1, u2 });
    }

    let rows = [WeightedEquation::new(u1, phi1), WeightedEquation::new(u2, phi2)];
    let equations = |p: [f64; 2]| [rows[0].residual(p), rows[1].residual(p)];
    let jacobian = |_: [f64; 2]| [rows[0].gradient(), rows[1].gradient()];

    tracing::trace!(u1, u2, phi1, phi2, "fitting shape coefficients");

    let solution = solve_2x2_with_jacobian(
        equations,
        jacobian,
        settings.initial_guess,
        &settings.newton_options(),
    )
    .map_err(|err| {
        tracing::debug!(error = %err, "coefficient solve failed");
        match err {
            RootError::Singular { .. } => Error::DegenerateSystem { u1, u2 },
            RootError::NotConverged {
                iterations,
                residual,
                ..
            } => Error::NonConvergence {
                iterations,
                residual,
            },
            RootError::NonFinite { iteration } => Error::NonConvergence {
                iterations: iteration,
                residual: f64::NAN,
            },
        }
    })?;

    let coefficients = Coefficients::new(solution.root[0], solution.root[1]);
    let advisories: Vec<Advisory> = check_coefficients(coefficients.n1, coefficients.n2)
        .into_iter()
        .collect();

    tracing::debug!(
        n1 = coefficients.n1,
        n2 = coefficients.n2,
        iterations = solution.iterations,
        residual = solution.residual,
        "shape coefficients fitted"
    );

    Ok(CoefficientFit {
        coefficients,
        iterations: solution.iterations,
        residual: solution.residual,
        converged: true,
        advisories,
    })
}

/// `expected_euler(u, n1, n2) = phi` rewritten as `n1 + n2·√u − c = 0`,
/// with `c = exp(u/2)·(phi − P(χ²₁ > u))`, scaled by `max(1, |c|)`.
///
/// `c` overflows for `u` beyond roughly 1400; the residual is then
/// non-finite and the fit fails as non-convergence.
#[derive(Debug, Clone, Copy)]
struct WeightedEquation {
    sqrt_u: f64,
    target: f64,
    scale: f64,
}

impl WeightedEquation {
    fn new(u: f64, phi: f64) -> Self {
        let weight = (0.5 * u).exp();
        let target = weight * phi - weight * chi2_survival_1dof(u);
        WeightedEquation {
            sqrt_u: u.sqrt(),
            target,
            scale: target.abs().max(1.0),
        }
    }

    fn residual(&self, p: [f64; 2]) -> f64 {
        (p[0] + p[1] * self.sqrt_u - self.target) / self.scale
    }

    fn gradient(&self) -> [f64; 2] {
        [1.0 / self.scale, self.sqrt_u / self.scale]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_known_coefficients() {
        let (u1, u2) = (1.0, 4.0);
        let phi1 = expected_euler(u1, 0.5, 0.8).unwrap();
        let phi2 = expected_euler(u2, 0.5, 0.8).unwrap();

        let c = get_coefficients(u1, u2, phi1, phi2).unwrap();
        assert!((c.n1 - 0.5).abs() < 1e-6, "{c:?}");
        assert!((c.n2 - 0.8).abs() < 1e-6, "{c:?}");
    }

    #[test]
    fn fit_reports_diagnostics() {
        let phi1 = expected_euler(0.5, 2.0, 3.0).unwrap();
        let phi2 = expected_euler(9.0, 2.0, 3.0).unwrap();
        let fit = fit_coefficients(0.5, 9.0, phi1, phi2, &SolverSettings::default()).unwrap();

        assert!(fit.converged);
        assert!(fit.iterations >= 1);
        assert!(fit.residual <= SolverSettings::default().tolerance);
        assert!(fit.advisories.is_empty());
    }

    #[test]
    fn equal_thresholds_are_degenerate() {
        let err = get_coefficients(4.0, 4.0, 0.3, 0.3).unwrap_err();
        assert!(matches!(err, Error::DegenerateSystem { u1, u2 } if u1 == 4.0 && u2 == 4.0));

        let err = get_coefficients(4.0, 4.0, 0.3, 0.7).unwrap_err();
        assert!(matches!(err, Error::DegenerateSystem { .. }));
    }

    #[test]
    fn invalid_thresholds_are_rejected_first() {
        let err = get_coefficients(-1.0, 4.0, 1.0, 0.3).unwrap_err();
        assert!(matches!(err, Error::InvalidThreshold { u } if u == -1.0));
    }

    #[test]
    fn negative_coefficients_are_flagged_not_rejected() {
        // Fewer excursions than pure chi-square noise implies.
        let phi1 = expected_euler(1.0, -0.4, 0.2).unwrap();
        let phi2 = expected_euler(4.0, -0.4, 0.2).unwrap();
        let fit = fit_coefficients(1.0, 4.0, phi1, phi2, &SolverSettings::default()).unwrap();

        assert!((fit.coefficients.n1 + 0.4).abs() < 1e-6);
        assert_eq!(fit.advisories.len(), 1);
        assert!(matches!(
            fit.advisories[0],
            Advisory::NegativeCoefficients { .. }
        ));
    }

    #[test]
    fn overflowing_weighted_target_reports_non_convergence() {
        // exp(u/2)·phi exceeds f64::MAX.
        let err = get_coefficients(4.0, 9.0, 1e308, 0.3).unwrap_err();
        assert!(matches!(err, Error::NonConvergence { .. }), "{err:?}");
    }

    #[test]
    fn high_thresholds_recover_known_coefficients() {
        for &(u1, u2) in &[(16.0, 25.0), (36.0, 49.0), (50.0, 60.0), (100.0, 144.0)] {
            let phi1 = expected_euler(u1, 0.5, 0.8).unwrap();
            let phi2 = expected_euler(u2, 0.5, 0.8).unwrap();
            let fit = fit_coefficients(u1, u2, phi1, phi2, &SolverSettings::default()).unwrap();

            assert!(fit.iterations >= 1, "({u1}, {u2}) accepted the initial guess");
            assert!((fit.coefficients.n1 - 0.5).abs() < 1e-6, "({u1}, {u2}): {fit:?}");
            assert!((fit.coefficients.n2 - 0.8).abs() < 1e-6, "({u1}, {u2}): {fit:?}");
        }
    }

    #[test]
    fn nearly_equal_thresholds_are_degenerate() {
        let err = get_coefficients(1.0, 1.0 + 1e-15, 1.1, 1.1).unwrap_err();
        assert!(matches!(err, Error::DegenerateSystem { .. }), "{err:?}");
    }

    #[test]
    fn large_targets_converge_on_relative_tolerance() {
        // phi = 0.3 at u = 50 puts c near 2e10.
        let fit = fit_coefficients(40.0, 50.0, 0.2, 0.3, &SolverSettings::default()).unwrap();
        assert!(fit.residual <= SolverSettings::default().tolerance);
        let back = fit.coefficients.expected_euler(50.0).unwrap();
        assert!(((back - 0.3) / 0.3).abs() < 1e-8, "{back}");
    }

    #[test]
    fn non_finite_observations_do_not_converge() {
        let err = get_coefficients(1.0, 4.0, f64::NAN, 0.3).unwrap_err();
        assert!(matches!(err, Error::NonConvergence { .. }));
    }

    #[test]
    fn custom_initial_guess_reaches_same_root() {
        let phi1 = expected_euler(1.0, 0.5, 0.8).unwrap();
        let phi2 = expected_euler(4.0, 0.5, 0.8).unwrap();
        let settings = SolverSettings {
            initial_guess: [50.0, -20.0],
            ..SolverSettings::default()
        };
        let fit = fit_coefficients(1.0, 4.0, phi1, phi2, &settings).unwrap();
        assert!((fit.coefficients.n1 - 0.5).abs() < 1e-6);
        assert!((fit.coefficients.n2 - 0.8).abs() < 1e-6);
    }
}
