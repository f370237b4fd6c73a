//! Numerical primitives for the 2D look-elsewhere correction.

pub mod math;

pub use math::chi2::*;
pub use math::normal::*;
pub use math::roots::{solve_2x2, solve_2x2_with_jacobian, NewtonOptions, RootError, RootSolution};
