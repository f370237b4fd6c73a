//! Standard normal CDF, survival and quantile, plus the one-sided
//! p-value ↔ significance conversions used for reporting.
//!
//! Tails are computed through `erfc`/`erfc_inv` so small p-values keep full
//! relative precision (`1 - Φ(z)` would cancel catastrophically for z > 8).

use std::f64::consts::SQRT_2;

use statrs::function::erf::{erfc, erfc_inv};

/// Standard normal CDF Φ(z).
pub fn normal_cdf(z: f64) -> f64 {
    if z.is_nan() {
        return f64::NAN;
    }
    0.5 * erfc(-z / SQRT_2)
}

/// Standard normal survival function 1 − Φ(z).
pub fn normal_sf(z: f64) -> f64 {
    if z.is_nan() {
        return f64::NAN;
    }
    0.5 * erfc(z / SQRT_2)
}

/// Standard normal quantile Φ⁻¹(p).
///
/// Returns ±∞ at the endpoints and NaN outside `[0, 1]`.
pub fn normal_quantile(p: f64) -> f64 {
    if p.is_nan() || !(0.0..=1.0).contains(&p) {
        return f64::NAN;
    }
    if p == 0.0 {
        return f64::NEG_INFINITY;
    }
    if p == 1.0 {
        return f64::INFINITY;
    }
    -SQRT_2 * erfc_inv(2.0 * p)
}

/// One-sided p-value for a significance of `z` standard deviations.
pub fn p_value_from_significance(z: f64) -> f64 {
    normal_sf(z)
}

/// One-sided significance `−Φ⁻¹(p)` for a p-value.
///
/// NaN when `p` lies outside `[0, 1]`; the caller decides how to flag it.
pub fn significance_from_p_value(p: f64) -> f64 {
    if p.is_nan() || !(0.0..=1.0).contains(&p) {
        return f64::NAN;
    }
    if p == 0.0 {
        return f64::INFINITY;
    }
    if p == 1.0 {
        return f64::NEG_INFINITY;
    }
    SQRT_2 * erfc_inv(2.0 * p)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        if a.is_nan() || b.is_nan() {
            return false;
        }
        (a - b).abs() <= tol
    }

    #[test]
    fn cdf_reference_values() {
        assert!(approx_eq(normal_cdf(0.0), 0.5, 1e-15));
        assert!(approx_eq(normal_cdf(1.0), 0.841_344_746_068_542_9, 1e-14));
        assert!(approx_eq(normal_cdf(-3.0), 0.001_349_898_031_630_094_6, 1e-15));
    }

    #[test]
    fn sf_keeps_precision_in_far_tail() {
        let p = normal_sf(10.0);
        assert!(p > 0.0);
        assert!(approx_eq(p / 7.619_853_024_160_527e-24, 1.0, 1e-8));
    }

    #[test]
    fn quantile_inverts_cdf() {
        for &z in &[-5.0, -2.5, -1.0, 0.0, 0.3, 1.96, 4.0] {
            let p = normal_cdf(z);
            assert!(approx_eq(normal_quantile(p), z, 1e-9), "z={z}");
        }
    }

    #[test]
    fn quantile_endpoints_and_invalid() {
        assert_eq!(normal_quantile(0.0), f64::NEG_INFINITY);
        assert_eq!(normal_quantile(1.0), f64::INFINITY);
        assert!(normal_quantile(-0.1).is_nan());
        assert!(normal_quantile(1.1).is_nan());
        assert!(normal_quantile(f64::NAN).is_nan());
    }

    #[test]
    fn significance_round_trip() {
        for &z in &[0.5, 1.0, 3.0, 5.0, 7.0] {
            let p = p_value_from_significance(z);
            assert!(approx_eq(significance_from_p_value(p), z, 1e-9), "z={z}");
        }
    }

    #[test]
    fn three_sigma_p_value() {
        assert!(approx_eq(
            p_value_from_significance(3.0),
            0.001_349_898_031_630_094_6,
            1e-15
        ));
    }

    #[test]
    fn significance_out_of_range_is_nan() {
        assert!(significance_from_p_value(-0.2).is_nan());
        assert!(significance_from_p_value(1.5).is_nan());
        assert_eq!(significance_from_p_value(0.0), f64::INFINITY);
        assert!(approx_eq(significance_from_p_value(0.5), 0.0, 1e-12));
    }
}
