//! Damped Newton iteration for two equations in two unknowns.
//!
//! The Jacobian is either supplied by the caller or estimated by forward
//! differences, and the Newton step is solved with Cramer's rule. A backtracking line search halves the step
//! until the residual decreases. Every exit path reports the residual and
//! iteration count so callers can tell a root from a stall.

use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_MAX_ITERS: usize = 100;
const DEFAULT_TOLERANCE: f64 = 1e-10;
const DEFAULT_FD_STEP: f64 = 1e-7;
const DEFAULT_SINGULAR_TOLERANCE: f64 = 1e-12;
const MAX_HALVINGS: usize = 30;

/// Options for [`solve_2x2`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NewtonOptions {
    /// Iteration budget; exceeding it is reported as [`RootError::NotConverged`].
    pub max_iterations: usize,
    /// Converged once the max-norm of the residual is at or below this.
    pub tolerance: f64,
    /// Relative forward-difference step for the Jacobian.
    pub fd_step: f64,
    /// `|det J|` below this fraction of `|J00·J11| + |J01·J10|` is singular.
    pub singular_tolerance: f64,
}

impl Default for NewtonOptions {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERS,
            tolerance: DEFAULT_TOLERANCE,
            fd_step: DEFAULT_FD_STEP,
            singular_tolerance: DEFAULT_SINGULAR_TOLERANCE,
        }
    }
}

/// A converged root.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RootSolution {
    pub root: [f64; 2],
    /// Max-norm of the residual at `root`.
    pub residual: f64,
    /// Newton steps taken (0 when the initial guess already satisfies the system).
    pub iterations: usize,
}

/// Failure modes of the Newton iteration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RootError {
    #[error("singular Jacobian at iteration {iteration} (det={determinant:e})")]
    Singular { iteration: usize, determinant: f64 },

    #[error("no convergence after {iterations} iterations (residual={residual:e})")]
    NotConverged {
        iterations: usize,
        residual: f64,
        last: [f64; 2],
    },

    #[error("non-finite residual at iteration {iteration}")]
    NonFinite { iteration: usize },
}

fn max_norm(v: [f64; 2]) -> f64 {
    v[0].abs().max(v[1].abs())
}

fn is_finite(v: [f64; 2]) -> bool {
    v[0].is_finite() && v[1].is_finite()
}

/// Find `x` with `f(x) = 0` starting from `initial`, with a forward-difference
/// Jacobian.
pub fn solve_2x2<F>(f: F, initial: [f64; 2], options: &NewtonOptions) -> Result<RootSolution, RootError>
where
    F: Fn([f64; 2]) -> [f64; 2],
{
    let fd_jacobian = |x: [f64; 2]| jacobian(&f, x, f(x), options.fd_step);
    solve_2x2_with_jacobian(&f, fd_jacobian, initial, options)
}

/// Find `x` with `f(x) = 0` starting from `initial`, with the Jacobian
/// `[[df0/dx0, df0/dx1], [df1/dx0, df1/dx1]]` from `jacobian_at(x)`.
///
/// `options.fd_step` is unused.
pub fn solve_2x2_with_jacobian<F, J>(
    f: F,
    jacobian_at: J,
    initial: [f64; 2],
    options: &NewtonOptions,
) -> Result<RootSolution, RootError>
where
    F: Fn([f64; 2]) -> [f64; 2],
    J: Fn([f64; 2]) -> [[f64; 2]; 2],
{
    let mut x = initial;
    let mut r = f(x);

    for iteration in 0..options.max_iterations {
        if !is_finite(r) {
            return Err(RootError::NonFinite { iteration });
        }
        let norm = max_norm(r);
        if norm <= options.tolerance {
            return Ok(RootSolution {
                root: x,
                residual: norm,
                iterations: iteration,
            });
        }

        let jac = jacobian_at(x);
        let det = jac[0][0] * jac[1][1] - jac[0][1] * jac[1][0];
        let scale = (jac[0][0] * jac[1][1]).abs() + (jac[0][1] * jac[1][0]).abs();
        if !det.is_finite() || scale == 0.0 || det.abs() <= options.singular_tolerance * scale {
            return Err(RootError::Singular {
                iteration,
                determinant: det,
            });
        }

        let dx = [
            -(jac[1][1] * r[0] - jac[0][1] * r[1]) / det,
            -(jac[0][0] * r[1] - jac[1][0] * r[0]) / det,
        ];

        // Backtrack until the residual shrinks; fall back to the full step.
        let mut lambda = 1.0;
        let mut accepted = None;
        for _ in 0..MAX_HALVINGS {
            let trial = [x[0] + lambda * dx[0], x[1] + lambda * dx[1]];
            let trial_r = f(trial);
            if is_finite(trial_r) && max_norm(trial_r) < norm {
                accepted = Some((trial, trial_r));
                break;
            }
            lambda *= 0.5;
        }
        let (next_x, next_r) = accepted.unwrap_or_else(|| {
            let full = [x[0] + dx[0], x[1] + dx[1]];
            (full, f(full))
        });
        x = next_x;
        r = next_r;
    }

    if !is_finite(r) {
        return Err(RootError::NonFinite {
            iteration: options.max_iterations,
        });
    }
    let residual = max_norm(r);
    if residual <= options.tolerance {
        return Ok(RootSolution {
            root: x,
            residual,
            iterations: options.max_iterations,
        });
    }
    Err(RootError::NotConverged {
        iterations: options.max_iterations,
        residual,
        last: x,
    })
}

fn jacobian<F>(f: &F, x: [f64; 2], r: [f64; 2], fd_step: f64) -> [[f64; 2]; 2]
where
    F: Fn([f64; 2]) -> [f64; 2],
{
    let mut jac = [[0.0; 2]; 2];
    for j in 0..2 {
        let h = fd_step * x[j].abs().max(1.0);
        let mut shifted = x;
        shifted[j] += h;
        let fs = f(shifted);
        for i in 0..2 {
            jac[i][j] = (fs[i] - r[i]) / h;
        }
    }
    jac
}
