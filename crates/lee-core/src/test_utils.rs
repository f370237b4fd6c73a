//! Test utilities for lee-core.
//!
//! - Assertion macros shared by unit and integration tests
//! - The 7×7 reference excursion set with known Euler characteristic
//! - Seeded toy surfaces for synthetic calibration
//! - Fixture loading helpers

use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{ChiSquared, Distribution};

use crate::surface::{Axis, Surface};

/// Assert that a Result is Ok and return the value.
#[macro_export]
macro_rules! assert_ok {
    ($expr:expr) => {
        match $expr {
            Ok(val) => val,
            Err(e) => panic!("Expected Ok, got Err: {:?}", e),
        }
    };
    ($expr:expr, $msg:expr) => {
        match $expr {
            Ok(val) => val,
            Err(e) => panic!("{}: {:?}", $msg, e),
        }
    };
}

/// Assert that two floating point numbers are approximately equal.
#[macro_export]
macro_rules! assert_approx_eq {
    ($a:expr, $b:expr) => {
        $crate::assert_approx_eq!($a, $b, 1e-6_f64)
    };
    ($a:expr, $b:expr, $epsilon:expr) => {{
        let a: f64 = $a;
        let b: f64 = $b;
        let eps: f64 = $epsilon;
        let diff = (a - b).abs();
        if !(diff <= eps) {
            panic!(
                "assertion failed: `(left ~= right)` (left: `{}`, right: `{}`, diff: `{}`, epsilon: `{}`)",
                a, b, diff, eps
            );
        }
    }};
}

/// Fixture directory relative to crate root.
pub const FIXTURES_DIR: &str = "tests/fixtures";

/// Path to a test fixture file.
pub fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join(FIXTURES_DIR)
        .join(name)
}

/// In-set cells of the reference excursion set (Fig. 3 of Vitells & Gross).
#[rustfmt::skip]
const REFERENCE_CELLS: [(usize, usize); 18] = [
    (1, 2), (1, 3),
    (2, 1), (2, 2), (2, 3), (2, 4),
    (3, 1), (3, 2), (3, 3), (3, 4), (3, 5),
    (4, 1), (4, 2), (4, 3), (4, 4),
    (5, 3),
    (6, 0), (6, 1),
];

/// Euler characteristic of [`reference_grid`]: 18 − 23 + 7.
pub const REFERENCE_EULER: i64 = 2;

/// The 7×7 reference grid, transposed so `(i, j)` above lands at `[j][i]`.
pub fn reference_grid() -> Vec<Vec<f64>> {
    let mut grid = vec![vec![0.0; 7]; 7];
    for &(i, j) in REFERENCE_CELLS.iter() {
        grid[j][i] = 1.0;
    }
    grid
}

/// Shape of a toy background scan.
#[derive(Debug, Clone, Copy)]
pub struct ToyScan {
    /// Columns, spanning x in [-1, 1).
    pub nx: usize,
    /// Rows, spanning y in [-1, 1).
    pub ny: usize,
    /// Number of Gaussian bumps.
    pub components: usize,
    /// Bump standard deviation.
    pub width: f64,
}

impl Default for ToyScan {
    fn default() -> Self {
        ToyScan {
            nx: 100,
            ny: 200,
            components: 10,
            width: 0.09,
        }
    }
}

/// One toy surface: a sum of Gaussian bumps with χ²₁ amplitudes placed
/// uniformly in `[-1, 1)²`.
pub fn toy_surface<R: Rng>(scan: &ToyScan, rng: &mut R) -> Surface {
    let chi2 = ChiSquared::new(1.0).expect("one degree of freedom is valid");
    let bumps: Vec<(f64, f64, f64)> = (0..scan.components)
        .map(|_| {
            let x = 2.0 * rng.random::<f64>() - 1.0;
            let y = 2.0 * rng.random::<f64>() - 1.0;
            (x, y, chi2.sample(rng))
        })
        .collect();

    let denom = 2.0 * scan.width * scan.width;
    let values = (0..scan.ny)
        .map(|row| {
            let y = -1.0 + 2.0 * row as f64 / scan.ny as f64;
            (0..scan.nx)
                .map(|col| {
                    let x = -1.0 + 2.0 * col as f64 / scan.nx as f64;
                    bumps
                        .iter()
                        .map(|&(bx, by, amp)| {
                            amp * (-((x - bx).powi(2) + (y - by).powi(2)) / denom).exp()
                        })
                        .sum()
                })
                .collect()
        })
        .collect();

    Surface::new(values)
        .expect("toy surface is finite and rectangular")
        .with_axes(
            Some(Axis {
                name: "x".to_string(),
                min: -1.0,
                max: 1.0,
            }),
            Some(Axis {
                name: "y".to_string(),
                min: -1.0,
                max: 1.0,
            }),
        )
}

/// `count` toy surfaces from a fixed seed.
pub fn toy_surfaces(scan: &ToyScan, count: usize, seed: u64) -> Vec<Surface> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count).map(|_| toy_surface(scan, &mut rng)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::euler::calculate_euler_characteristic;

    #[test]
    fn reference_grid_has_known_euler() {
        let counts = calculate_euler_characteristic(&reference_grid()).unwrap();
        assert_eq!(counts.euler, REFERENCE_EULER);
        assert_eq!((counts.vertices, counts.edges, counts.faces), (18, 23, 7));
    }

    #[test]
    fn toy_surfaces_are_reproducible() {
        let scan = ToyScan {
            nx: 20,
            ny: 30,
            ..ToyScan::default()
        };
        let a = toy_surfaces(&scan, 2, 7);
        let b = toy_surfaces(&scan, 2, 7);
        assert_eq!(a, b);
        assert_ne!(a[0], a[1]);
        assert_eq!((a[0].rows(), a[0].cols()), (30, 20));
        assert!(a[0].values().iter().all(|&v| v >= 0.0));
    }

    #[test]
    fn approx_macro_accepts_close_values() {
        crate::assert_approx_eq!(1.0, 1.0 + 1e-9);
        crate::assert_approx_eq!(0.5, 0.51, 0.02);
    }
}
