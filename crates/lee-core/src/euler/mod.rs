//! Euler-characteristic machinery for chi-square random fields.
//!
//! - [`model`]: the expected Euler characteristic `E[φ(A_u)]`
//! - [`solver`]: fitting the shape coefficients `(n1, n2)`
//! - [`topology`]: counting vertices, edges and faces of an excursion set

pub mod model;
pub mod solver;
pub mod topology;

pub use model::{expected_euler, Coefficients};
pub use solver::{fit_coefficients, get_coefficients, CoefficientFit};
pub use topology::{calculate_euler_characteristic, EulerCounts, ExcursionSet};
