//! Expected Euler characteristic of a 2D chi-square(1) excursion set.
//!
//! For a field whose marginal is χ²₁ the expected Euler characteristic of
//! the set `{q > u}` is
//!
//! ```text
//! E[φ(A_u)] = P(χ²₁ > u) + exp(−u/2) · (n1 + n2·√u)
//! ```
//!
//! where `n1`, `n2` depend only on the correlation structure of the field.

use lee_common::{Error, Result};
use lee_math::chi2_survival_1dof;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Shape coefficients of the random field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Coefficients {
    pub n1: f64,
    pub n2: f64,
}

impl Coefficients {
    pub fn new(n1: f64, n2: f64) -> Self {
        Coefficients { n1, n2 }
    }

    /// `E[φ(A_u)]` for these coefficients.
    pub fn expected_euler(&self, u: f64) -> Result<f64> {
        expected_euler(u, self.n1, self.n2)
    }

    /// True when either coefficient is negative.
    pub fn is_unphysical(&self) -> bool {
        self.n1 < 0.0 || self.n2 < 0.0
    }
}

pub(crate) fn check_threshold(u: f64) -> Result<()> {
    if u.is_finite() && u >= 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidThreshold { u })
    }
}

/// Expected Euler characteristic of the excursion set above `u`.
pub fn expected_euler(u: f64, n1: f64, n2: f64) -> Result<f64> {
    check_threshold(u)?;
    Ok(chi2_survival_1dof(u) + (-0.5 * u).exp() * (n1 + n2 * u.sqrt()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn zero_coefficients_reduce_to_chi2_tail() {
        for &u in &[0.0, 0.5, 1.0, 4.0, 9.0, 25.0] {
            let value = expected_euler(u, 0.0, 0.0).unwrap();
            assert_eq!(value, chi2_survival_1dof(u));
        }
    }

    #[test]
    fn whole_space_at_zero_threshold() {
        // sf(0) = 1 and √0 = 0, so only n1 contributes.
        assert_eq!(expected_euler(0.0, 0.0, 0.0).unwrap(), 1.0);
        assert_eq!(expected_euler(0.0, 0.5, 123.0).unwrap(), 1.5);
    }

    #[test]
    fn known_values() {
        assert!(approx_eq(expected_euler(1.0, 0.5, 0.8).unwrap(), 1.1058003654893374, 1e-12));
        assert!(approx_eq(expected_euler(4.0, 0.5, 0.8).unwrap(), 0.3297043586932451, 1e-12));
        assert!(approx_eq(expected_euler(9.0, 0.5, 0.8).unwrap(), 0.03491588602416289, 1e-12));
    }

    #[test]
    fn decays_for_large_thresholds() {
        let far = expected_euler(400.0, 3.0, 5.0).unwrap();
        assert!(far >= 0.0 && far < 1e-80, "{far}");
    }

    #[test]
    fn rejects_invalid_thresholds() {
        for &u in &[-1.0, -1e-12, f64::NAN, f64::INFINITY] {
            let err = expected_euler(u, 1.0, 1.0).unwrap_err();
            assert!(matches!(err, Error::InvalidThreshold { .. }), "{u}");
        }
    }

    #[test]
    fn coefficients_helpers() {
        let c = Coefficients::new(0.5, 0.8);
        assert_eq!(c.expected_euler(4.0).unwrap(), expected_euler(4.0, 0.5, 0.8).unwrap());
        assert!(!c.is_unphysical());
        assert!(Coefficients::new(-0.1, 0.8).is_unphysical());
    }
}
