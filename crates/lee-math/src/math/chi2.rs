//! Chi-square tail probabilities.
//!
//! The look-elsewhere model only needs the survival function of a χ²
//! variable with one degree of freedom, which reduces to the complementary
//! error function: `P(χ²₁ > u) = erfc(√(u/2))`. The general-`k` variant goes
//! through the regularized upper incomplete gamma function.

use statrs::function::erf::erfc;
use statrs::function::gamma::gamma_ur;

/// Survival function `P(χ²₁ > u)` for one degree of freedom.
///
/// Returns 1 for `u <= 0` and NaN for NaN input.
pub fn chi2_survival_1dof(u: f64) -> f64 {
    if u.is_nan() {
        return f64::NAN;
    }
    if u <= 0.0 {
        return 1.0;
    }
    if u.is_infinite() {
        return 0.0;
    }
    erfc((0.5 * u).sqrt())
}

/// Survival function `P(χ²_k > u)` for `k` degrees of freedom.
pub fn chi2_survival(u: f64, dof: f64) -> f64 {
    if u.is_nan() || dof.is_nan() {
        return f64::NAN;
    }
    if dof <= 0.0 || dof.is_infinite() {
        return f64::NAN;
    }
    if u <= 0.0 {
        return 1.0;
    }
    if u.is_infinite() {
        return 0.0;
    }
    if dof == 1.0 {
        return chi2_survival_1dof(u);
    }
    gamma_ur(0.5 * dof, 0.5 * u)
}

/// CDF `P(χ²_k <= u)`.
pub fn chi2_cdf(u: f64, dof: f64) -> f64 {
    let sf = chi2_survival(u, dof);
    if sf.is_nan() {
        return f64::NAN;
    }
    1.0 - sf
}
