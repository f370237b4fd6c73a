//! Typed configuration for the coefficient solver and result reporting.
//!
//! Every field has a built-in default, so an empty JSON object `{}` is a
//! complete configuration:
//!
//! ```json
//! {
//!   "schema_version": "1.0.0",
//!   "solver": { "initial_guess": [1.0, 1.0], "max_iterations": 100, "tolerance": 1e-10 },
//!   "report": { "strict": false, "precision": 6 }
//! }
//! ```

use lee_math::NewtonOptions;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::validate::ValidationError;

/// Top-level configuration document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LeeConfig {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    #[serde(default)]
    pub solver: SolverSettings,

    #[serde(default)]
    pub report: ReportSettings,
}

/// Settings for the Newton solve that fits `(n1, n2)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SolverSettings {
    /// Starting point `(n1, n2)`.
    #[serde(default = "default_initial_guess")]
    pub initial_guess: [f64; 2],

    /// Iteration cap; hitting it is reported as non-convergence.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Max-norm of the scaled residual accepted as converged.
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,

    /// Relative determinant below which the system counts as singular.
    #[serde(default = "default_singular_tolerance")]
    pub singular_tolerance: f64,
}

/// How results are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ReportSettings {
    /// Escalate advisories (negative coefficients, p-value outside [0, 1]) to errors.
    #[serde(default)]
    pub strict: bool,

    /// Significant digits in human-readable output.
    #[serde(default = "default_precision")]
    pub precision: usize,
}

fn default_schema_version() -> String {
    crate::CONFIG_SCHEMA_VERSION.to_string()
}

fn default_initial_guess() -> [f64; 2] {
    [1.0, 1.0]
}

fn default_max_iterations() -> usize {
    NewtonOptions::default().max_iterations
}

fn default_tolerance() -> f64 {
    NewtonOptions::default().tolerance
}

fn default_singular_tolerance() -> f64 {
    NewtonOptions::default().singular_tolerance
}

fn default_precision() -> usize {
    6
}

impl Default for LeeConfig {
    fn default() -> Self {
        LeeConfig {
            schema_version: default_schema_version(),
            solver: SolverSettings::default(),
            report: ReportSettings::default(),
        }
    }
}

impl Default for SolverSettings {
    fn default() -> Self {
        SolverSettings {
            initial_guess: default_initial_guess(),
            max_iterations: default_max_iterations(),
            tolerance: default_tolerance(),
            singular_tolerance: default_singular_tolerance(),
        }
    }
}

impl Default for ReportSettings {
    fn default() -> Self {
        ReportSettings {
            strict: false,
            precision: default_precision(),
        }
    }
}

impl SolverSettings {
    /// Newton options derived from these settings.
    pub fn newton_options(&self) -> NewtonOptions {
        NewtonOptions {
            max_iterations: self.max_iterations,
            tolerance: self.tolerance,
            singular_tolerance: self.singular_tolerance,
            ..NewtonOptions::default()
        }
    }
}

impl LeeConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ValidationError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        Self::from_json(&content)
    }

    /// Parse configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ValidationError> {
        serde_json::from_str(json)
            .map_err(|e| ValidationError::ParseError(format!("Invalid JSON: {}", e)))
    }

    /// JSON Schema for the configuration document.
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(LeeConfig)
    }
}
