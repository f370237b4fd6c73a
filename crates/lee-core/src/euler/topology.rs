//! Discrete Euler characteristic of a thresholded grid.
//!
//! Each in-set cell is a vertex, each pair of horizontally or vertically
//! adjacent in-set cells an edge, and each fully in-set 2×2 block a face:
//!
//! ```text
//! φ = V − E + F
//! ```
//!
//! Cells outside the grid count as out of the set, so nothing wraps around.
//! For 4-connected sets without holes this is the number of components.

use lee_common::{Error, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::model::check_threshold;
use crate::surface::Surface;

/// Cell complex counts and the resulting Euler characteristic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EulerCounts {
    pub vertices: usize,
    pub edges: usize,
    pub faces: usize,
    pub euler: i64,
}

impl EulerCounts {
    fn new(vertices: usize, edges: usize, faces: usize) -> Self {
        EulerCounts {
            vertices,
            edges,
            faces,
            euler: vertices as i64 - edges as i64 + faces as i64,
        }
    }
}

impl std::fmt::Display for EulerCounts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}-{}+{}={}",
            self.vertices, self.edges, self.faces, self.euler
        )
    }
}

/// Row-major indicator grid of cells above a threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExcursionSet {
    rows: usize,
    cols: usize,
    cells: Vec<bool>,
}

impl ExcursionSet {
    /// Wrap a row-major indicator vector.
    pub fn from_indicator(rows: usize, cols: usize, cells: Vec<bool>) -> Result<Self> {
        if rows.checked_mul(cols) != Some(cells.len()) {
            return Err(Error::InvalidGrid(format!(
                "{} cells do not fill a {}x{} grid",
                cells.len(),
                rows,
                cols
            )));
        }
        Ok(ExcursionSet { rows, cols, cells })
    }

    /// Cells of `grid` strictly greater than `level`.
    ///
    /// Rows must all have the same length; NaN cells are never in the set.
    pub fn from_grid<R: AsRef<[f64]>>(grid: &[R], level: f64) -> Result<Self> {
        let rows = grid.len();
        let cols = grid.first().map_or(0, |row| row.as_ref().len());

        let mut cells = Vec::with_capacity(rows * cols);
        for (i, row) in grid.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != cols {
                return Err(Error::InvalidGrid(format!(
                    "row {} has {} columns, expected {}",
                    i,
                    row.len(),
                    cols
                )));
            }
            cells.extend(row.iter().map(|&v| v > level));
        }

        Ok(ExcursionSet { rows, cols, cells })
    }

    /// Excursion set `{q > u}` of a test-statistic surface.
    pub fn from_surface(surface: &Surface, u: f64) -> Result<Self> {
        check_threshold(u)?;
        Ok(ExcursionSet {
            rows: surface.rows(),
            cols: surface.cols(),
            cells: surface.values().iter().map(|&v| v > u).collect(),
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Whether cell `(row, col)` is in the set; out-of-range cells are not.
    pub fn contains(&self, row: usize, col: usize) -> bool {
        row < self.rows && col < self.cols && self.cells[row * self.cols + col]
    }

    /// Number of in-set cells.
    pub fn area(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    pub fn is_empty(&self) -> bool {
        !self.cells.iter().any(|&c| c)
    }

    pub fn transposed(&self) -> ExcursionSet {
        let mut cells = Vec::with_capacity(self.cells.len());
        for col in 0..self.cols {
            for row in 0..self.rows {
                cells.push(self.cells[row * self.cols + col]);
            }
        }
        ExcursionSet {
            rows: self.cols,
            cols: self.rows,
            cells,
        }
    }

    /// Vertex, edge and face counts of the set.
    pub fn euler_counts(&self) -> EulerCounts {
        let mut vertices = 0;
        let mut edges = 0;
        let mut faces = 0;

        for row in 0..self.rows {
            for col in 0..self.cols {
                if !self.contains(row, col) {
                    continue;
                }
                vertices += 1;
                let right = self.contains(row, col + 1);
                let below = self.contains(row + 1, col);
                edges += usize::from(right) + usize::from(below);
                if right && below && self.contains(row + 1, col + 1) {
                    faces += 1;
                }
            }
        }

        EulerCounts::new(vertices, edges, faces)
    }

    pub fn euler_characteristic(&self) -> i64 {
        self.euler_counts().euler
    }
}

/// Euler characteristic of the set of cells with value `> 0`.
///
/// Values are used only through their sign, so any positive magnitude counts
/// as one in-set cell. An empty grid has all counts zero.
pub fn calculate_euler_characteristic<R: AsRef<[f64]>>(grid: &[R]) -> Result<EulerCounts> {
    let counts = ExcursionSet::from_grid(grid, 0.0)?.euler_counts();
    tracing::trace!(%counts, "euler characteristic");
    Ok(counts)
}
