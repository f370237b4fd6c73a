//! Sampled test-statistic surfaces.
//!
//! A [`Surface`] holds `q = -2 log λ` on a regular grid over the two
//! nuisance parameters. Row index runs along the second parameter (`y`),
//! column index along the first (`x`). On disk a surface is a JSON document:
//!
//! ```json
//! {
//!   "values": [[0.1, 0.4], [2.3, 0.0]],
//!   "x_axis": { "name": "mass", "min": 100.0, "max": 200.0 },
//!   "y_axis": { "name": "width", "min": 1.0, "max": 10.0 }
//! }
//! ```

use std::path::Path;

use lee_common::{Error, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::euler::{EulerCounts, ExcursionSet};

/// Range of one nuisance parameter covered by the grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Axis {
    pub name: String,
    pub min: f64,
    pub max: f64,
}

impl Axis {
    /// Centre of bin `index` out of `bins` equal-width bins.
    pub fn bin_center(&self, index: usize, bins: usize) -> f64 {
        let width = (self.max - self.min) / bins as f64;
        self.min + (index as f64 + 0.5) * width
    }
}

/// Serialized form of a [`Surface`].
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SurfaceDocument {
    pub values: Vec<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_axis: Option<Axis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_axis: Option<Axis>,
}

/// Validated rectangular grid of finite test-statistic values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SurfaceDocument", into = "SurfaceDocument")]
pub struct Surface {
    rows: usize,
    cols: usize,
    values: Vec<f64>,
    x_axis: Option<Axis>,
    y_axis: Option<Axis>,
}

/// Location and value of the largest cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Peak {
    pub row: usize,
    pub col: usize,
    pub value: f64,
    /// `x` bin centre, when the surface has an x axis.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    /// `y` bin centre, when the surface has a y axis.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
}

impl Surface {
    /// Build a surface from rows of values.
    pub fn new(rows: Vec<Vec<f64>>) -> Result<Self> {
        let n_rows = rows.len();
        let n_cols = rows.first().map_or(0, Vec::len);
        if n_rows == 0 || n_cols == 0 {
            return Err(Error::InvalidGrid("surface has no cells".to_string()));
        }

        let mut values = Vec::with_capacity(n_rows * n_cols);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != n_cols {
                return Err(Error::InvalidGrid(format!(
                    "row {} has {} columns, expected {}",
                    i,
                    row.len(),
                    n_cols
                )));
            }
            if let Some(j) = row.iter().position(|v| !v.is_finite()) {
                return Err(Error::InvalidGrid(format!(
                    "non-finite value {} at row {}, column {}",
                    row[j], i, j
                )));
            }
            values.extend(row);
        }

        Ok(Surface {
            rows: n_rows,
            cols: n_cols,
            values,
            x_axis: None,
            y_axis: None,
        })
    }

    pub fn with_axes(mut self, x_axis: Option<Axis>, y_axis: Option<Axis>) -> Self {
        self.x_axis = x_axis;
        self.y_axis = y_axis;
        self
    }

    /// Parse a surface document.
    pub fn from_json(json: &str) -> Result<Self> {
        let doc: SurfaceDocument = serde_json::from_str(json)?;
        Surface::try_from(doc)
    }

    /// Read a surface document from disk.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Row-major values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row < self.rows && col < self.cols {
            Some(self.values[row * self.cols + col])
        } else {
            None
        }
    }

    pub fn x_axis(&self) -> Option<&Axis> {
        self.x_axis.as_ref()
    }

    pub fn y_axis(&self) -> Option<&Axis> {
        self.y_axis.as_ref()
    }

    /// Largest cell (first one in row-major order on ties).
    pub fn peak(&self) -> Peak {
        let mut best = 0;
        for (i, &v) in self.values.iter().enumerate() {
            if v > self.values[best] {
                best = i;
            }
        }
        let (row, col) = (best / self.cols, best % self.cols);
        Peak {
            row,
            col,
            value: self.values[best],
            x: self.x_axis.as_ref().map(|a| a.bin_center(col, self.cols)),
            y: self.y_axis.as_ref().map(|a| a.bin_center(row, self.rows)),
        }
    }

    /// Maximum local significance `√max(q, 0)`.
    pub fn max_local_significance(&self) -> f64 {
        self.peak().value.max(0.0).sqrt()
    }

    /// Counts for the excursion set above `u`.
    pub fn euler_counts_at(&self, u: f64) -> Result<EulerCounts> {
        Ok(ExcursionSet::from_surface(self, u)?.euler_counts())
    }

    /// Euler characteristic of the excursion set above `u`.
    pub fn euler_characteristic_at(&self, u: f64) -> Result<i64> {
        self.euler_counts_at(u).map(|c| c.euler)
    }
}

impl TryFrom<SurfaceDocument> for Surface {
    type Error = Error;

    fn try_from(doc: SurfaceDocument) -> Result<Self> {
        Ok(Surface::new(doc.values)?.with_axes(doc.x_axis, doc.y_axis))
    }
}

impl From<Surface> for SurfaceDocument {
    fn from(surface: Surface) -> Self {
        let cols = surface.cols;
        SurfaceDocument {
            values: surface.values.chunks(cols).map(<[f64]>::to_vec).collect(),
            x_axis: surface.x_axis,
            y_axis: surface.y_axis,
        }
    }
}
