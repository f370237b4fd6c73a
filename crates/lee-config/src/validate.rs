//! Configuration validation errors and semantic validation.

use thiserror::Error;

use crate::settings::{LeeConfig, ReportSettings, SolverSettings};

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Configuration validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::IoError(_) => 60,
            ValidationError::ParseError(_) => 61,
            ValidationError::InvalidValue { .. } => 65,
            ValidationError::VersionMismatch { .. } => 66,
        }
    }
}

const MAX_ITERATION_CAP: usize = 100_000;
const MAX_PRECISION: usize = 17;

/// Validate a configuration document semantically.
pub fn validate_config(config: &LeeConfig) -> ValidationResult<()> {
    if config.schema_version != crate::CONFIG_SCHEMA_VERSION {
        return Err(ValidationError::VersionMismatch {
            expected: crate::CONFIG_SCHEMA_VERSION.to_string(),
            actual: config.schema_version.clone(),
        });
    }

    validate_solver(&config.solver)?;
    validate_report(&config.report)?;

    Ok(())
}

fn validate_solver(solver: &SolverSettings) -> ValidationResult<()> {
    for (i, value) in solver.initial_guess.iter().enumerate() {
        if !value.is_finite() {
            return Err(ValidationError::InvalidValue {
                field: format!("solver.initial_guess[{}]", i),
                message: format!("Must be finite, got {}", value),
            });
        }
    }

    if solver.max_iterations == 0 || solver.max_iterations > MAX_ITERATION_CAP {
        return Err(ValidationError::InvalidValue {
            field: "solver.max_iterations".to_string(),
            message: format!(
                "Must be in [1, {}], got {}",
                MAX_ITERATION_CAP, solver.max_iterations
            ),
        });
    }

    if !(solver.tolerance.is_finite() && solver.tolerance > 0.0) {
        return Err(ValidationError::InvalidValue {
            field: "solver.tolerance".to_string(),
            message: format!("Must be positive, got {}", solver.tolerance),
        });
    }

    if !(0.0..1.0).contains(&solver.singular_tolerance) {
        return Err(ValidationError::InvalidValue {
            field: "solver.singular_tolerance".to_string(),
            message: format!("Must be in [0, 1), got {}", solver.singular_tolerance),
        });
    }

    Ok(())
}

fn validate_report(report: &ReportSettings) -> ValidationResult<()> {
    if report.precision == 0 || report.precision > MAX_PRECISION {
        return Err(ValidationError::InvalidValue {
            field: "report.precision".to_string(),
            message: format!("Must be in [1, {}], got {}", MAX_PRECISION, report.precision),
        });
    }
    Ok(())
}
