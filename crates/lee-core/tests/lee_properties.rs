//! Property-based tests for the expected Euler characteristic model,
//! the coefficient fit and the discrete topology.

use lee_core::{
    calculate_euler_characteristic, do_lee_correction, expected_euler, get_coefficients,
    ExcursionSet,
};
use lee_math::{chi2_survival, p_value_from_significance};
use proptest::prelude::*;

fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol * (1.0 + a.abs().max(b.abs()))
}

fn indicator_grid() -> impl Strategy<Value = (usize, usize, Vec<bool>)> {
    (1usize..8, 1usize..8).prop_flat_map(|(rows, cols)| {
        (
            Just(rows),
            Just(cols),
            prop::collection::vec(any::<bool>(), rows * cols),
        )
    })
}

fn to_grid(rows: usize, cols: usize, cells: &[bool]) -> Vec<Vec<f64>> {
    (0..rows)
        .map(|r| {
            (0..cols)
                .map(|c| if cells[r * cols + c] { 1.0 } else { 0.0 })
                .collect()
        })
        .collect()
}

// ============================================================================
// Model
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// With no shape terms the model is the χ²₁ tail.
    #[test]
    fn zero_coefficients_reduce_to_chi2_tail(u in 0.0..60.0f64) {
        let model = expected_euler(u, 0.0, 0.0).unwrap();
        let tail = chi2_survival(u, 1.0);
        prop_assert!(approx_eq(model, tail, 1e-10), "E({})={} vs χ² tail {}", u, model, tail);
    }

    /// Above u = 1 the expectation decreases for non-negative coefficients.
    #[test]
    fn expectation_decays_above_one(
        u in 1.0..40.0f64,
        du in 0.01..10.0f64,
        n1 in 0.0..50.0f64,
        n2 in 0.0..50.0f64,
    ) {
        let lo = expected_euler(u, n1, n2).unwrap();
        let hi = expected_euler(u + du, n1, n2).unwrap();
        prop_assert!(hi <= lo, "E({})={} < E({})={}", u, lo, u + du, hi);
    }

    #[test]
    fn negative_threshold_is_rejected(u in -100.0..-1e-9f64) {
        prop_assert!(expected_euler(u, 1.0, 1.0).is_err());
    }
}

// ============================================================================
// Coefficient fit
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    /// Fitting exact model values recovers the generating coefficients.
    #[test]
    fn fit_recovers_generating_coefficients(
        n1 in 0.0..20.0f64,
        n2 in 0.0..20.0f64,
        u1 in 0.5..60.0f64,
        gap in 1.0..30.0f64,
    ) {
        // Up to u2 = 90, where exp(-u/2) is far below the solver tolerance.
        let u2 = u1 + gap;
        let phi1 = expected_euler(u1, n1, n2).unwrap();
        let phi2 = expected_euler(u2, n1, n2).unwrap();
        let fitted = get_coefficients(u1, u2, phi1, phi2).unwrap();
        prop_assert!(approx_eq(fitted.n1, n1, 1e-4), "n1 {} vs {}", fitted.n1, n1);
        prop_assert!(approx_eq(fitted.n2, n2, 1e-4), "n2 {} vs {}", fitted.n2, n2);
    }

    /// Identical inputs give bit-identical outputs.
    #[test]
    fn correction_is_deterministic(
        z in 0.0..6.0f64,
        phi1 in 0.1..10.0f64,
        phi2 in 0.01..2.0f64,
    ) {
        let a = do_lee_correction(z, 1.0, 4.0, phi1, phi2);
        let b = do_lee_correction(z, 1.0, 4.0, phi1, phi2);
        match (a, b) {
            (Ok(a), Ok(b)) => {
                prop_assert_eq!(a.global_p_value.to_bits(), b.global_p_value.to_bits());
                prop_assert_eq!(a.coefficients.n1.to_bits(), b.coefficients.n1.to_bits());
                prop_assert_eq!(a.coefficients.n2.to_bits(), b.coefficients.n2.to_bits());
            }
            (Err(a), Err(b)) => prop_assert_eq!(a.code(), b.code()),
            _ => prop_assert!(false, "outcomes differ for identical inputs"),
        }
    }

    /// The global p-value never drops below the local one for a physical fit.
    #[test]
    fn global_p_value_dominates_local(
        z in 1.0..6.0f64,
        n1 in 0.0..20.0f64,
        n2 in 0.0..20.0f64,
    ) {
        let phi1 = expected_euler(1.0, n1, n2).unwrap();
        let phi2 = expected_euler(4.0, n1, n2).unwrap();
        let c = do_lee_correction(z, 1.0, 4.0, phi1, phi2).unwrap();
        // χ²₁ tail is twice the one-sided local p-value.
        let tail = 2.0 * p_value_from_significance(z);
        prop_assert!(c.global_p_value >= tail * (1.0 - 1e-6) - 1e-12);
    }
}

// ============================================================================
// Topology
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn counts_are_consistent((rows, cols, cells) in indicator_grid()) {
        let counts = calculate_euler_characteristic(&to_grid(rows, cols, &cells)).unwrap();
        prop_assert_eq!(
            counts.vertices as i64 - counts.edges as i64 + counts.faces as i64,
            counts.euler
        );
        prop_assert_eq!(counts.vertices, cells.iter().filter(|&&c| c).count());
    }

    #[test]
    fn euler_is_translation_invariant(
        (rows, cols, cells) in indicator_grid(),
        top in 0usize..3,
        left in 0usize..3,
    ) {
        let grid = to_grid(rows, cols, &cells);
        let mut shifted = vec![vec![0.0; cols + left + 2]; rows + top + 2];
        for (r, row) in grid.iter().enumerate() {
            for (c, &v) in row.iter().enumerate() {
                shifted[r + top][c + left] = v;
            }
        }
        let original = calculate_euler_characteristic(&grid).unwrap();
        let moved = calculate_euler_characteristic(&shifted).unwrap();
        prop_assert_eq!(original, moved);
    }

    #[test]
    fn euler_is_transpose_invariant((rows, cols, cells) in indicator_grid()) {
        let set = ExcursionSet::from_indicator(rows, cols, cells).unwrap();
        prop_assert_eq!(set.euler_characteristic(), set.transposed().euler_characteristic());
    }

    /// Sets separated by an empty column add their characteristics.
    #[test]
    fn separated_sets_are_additive(
        (rows, cols_a, cells_a) in indicator_grid(),
        seed in prop::collection::vec(any::<bool>(), 64),
    ) {
        let cols_b = 3;
        let a = to_grid(rows, cols_a, &cells_a);
        let b = to_grid(rows, cols_b, &seed[..rows * cols_b]);
        let joined: Vec<Vec<f64>> = a
            .iter()
            .zip(&b)
            .map(|(ra, rb)| {
                let mut row = ra.clone();
                row.push(0.0);
                row.extend(rb);
                row
            })
            .collect();

        let sum = calculate_euler_characteristic(&a).unwrap().euler
            + calculate_euler_characteristic(&b).unwrap().euler;
        prop_assert_eq!(calculate_euler_characteristic(&joined).unwrap().euler, sum);
    }
}
