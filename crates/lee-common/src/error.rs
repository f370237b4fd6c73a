//! Error types for the look-elsewhere correction.
//!
//! This module provides structured error handling with:
//! - Stable error codes for machine parsing
//! - Category classification for error grouping
//! - Remediation suggestions for humans
//! - Suggested actions for automated callers
//!
//! # Human-Facing Output
//!
//! ```text
//! ✗ Degenerate Calibration
//!   Reason: calibration thresholds coincide (u1=4, u2=4)
//!   Fix: Measure the Euler characteristic at two different thresholds.
//! ```
//!
//! # Machine-Facing Output
//!
//! ```json
//! {
//!   "code": 20,
//!   "category": "calibration",
//!   "message": "calibration thresholds coincide (u1=4, u2=4)",
//!   "recoverable": true,
//!   "suggested_action": "recalibrate",
//!   "context": { "u1": 4.0, "u2": 4.0 }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::advisory::{describe_all, Advisory};

/// Result type alias for look-elsewhere operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Malformed scalar or grid input.
    Input,
    /// Calibration data that cannot determine the coefficients.
    Calibration,
    /// Results outside the asymptotic model's valid range.
    Model,
    /// Configuration file errors.
    Config,
    /// File I/O and serialization errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Input => write!(f, "input"),
            ErrorCategory::Calibration => write!(f, "calibration"),
            ErrorCategory::Model => write!(f, "model"),
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Suggested actions for callers to take in response to errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestedAction {
    /// Correct the offending input value.
    FixInput,
    /// Provide different calibration thresholds or Euler characteristics.
    Recalibrate,
    /// Inspect the result; the asymptotic approximation may be breaking down.
    ReviewResult,
    /// Run the configuration check command.
    RunCheck,
    /// Retry the operation.
    Retry,
    /// Manual intervention required.
    ManualIntervention,
}

impl std::fmt::Display for SuggestedAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SuggestedAction::FixInput => write!(f, "fix_input"),
            SuggestedAction::Recalibrate => write!(f, "recalibrate"),
            SuggestedAction::ReviewResult => write!(f, "review_result"),
            SuggestedAction::RunCheck => write!(f, "run_check"),
            SuggestedAction::Retry => write!(f, "retry"),
            SuggestedAction::ManualIntervention => write!(f, "manual_intervention"),
        }
    }
}

/// Unified error type for the look-elsewhere correction.
#[derive(Error, Debug)]
pub enum Error {
    // Input errors (10-19)
    #[error("invalid threshold u={u}: must be finite and >= 0")]
    InvalidThreshold { u: f64 },

    #[error("invalid local significance z={z}: must be finite and >= 0")]
    InvalidSignificance { z: f64 },

    #[error("invalid grid: {0}")]
    InvalidGrid(String),

    // Calibration errors (20-29)
    #[error("calibration thresholds coincide (u1={u1}, u2={u2})")]
    DegenerateSystem { u1: f64, u2: f64 },

    #[error("coefficient solver did not converge after {iterations} iterations (residual={residual:e})")]
    NonConvergence { iterations: usize, residual: f64 },

    // Model errors (30-39)
    #[error("result outside the model's valid range: {}", describe_all(.advisories))]
    OutOfRangeResult { advisories: Vec<Advisory> },

    // Configuration errors (40-49)
    #[error("configuration error: {0}")]
    Config(String),

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the error code for this error type.
    ///
    /// Error codes are stable and grouped by category:
    /// - 10-19: Input errors
    /// - 20-29: Calibration errors
    /// - 30-39: Model errors
    /// - 40-49: Configuration errors
    /// - 60-69: I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::InvalidThreshold { .. } => 10,
            Error::InvalidSignificance { .. } => 11,
            Error::InvalidGrid(_) => 12,
            Error::DegenerateSystem { .. } => 20,
            Error::NonConvergence { .. } => 21,
            Error::OutOfRangeResult { .. } => 30,
            Error::Config(_) => 40,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::InvalidThreshold { .. }
            | Error::InvalidSignificance { .. }
            | Error::InvalidGrid(_) => ErrorCategory::Input,

            Error::DegenerateSystem { .. } | Error::NonConvergence { .. } => {
                ErrorCategory::Calibration
            }

            Error::OutOfRangeResult { .. } => ErrorCategory::Model,

            Error::Config(_) => ErrorCategory::Config,

            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// Returns whether the caller can resolve this error by changing inputs.
    ///
    /// None of these are transient: the computation is pure, so repeating a
    /// call with the same inputs fails the same way.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::InvalidThreshold { .. } => true,
            Error::InvalidSignificance { .. } => true,
            Error::InvalidGrid(_) => true,
            Error::DegenerateSystem { .. } => true,
            Error::NonConvergence { .. } => true,
            Error::OutOfRangeResult { .. } => false,
            Error::Config(_) => true,
            Error::Io(_) => true,
            Error::Json(_) => true,
        }
    }

    /// Returns the suggested action for automated callers.
    pub fn suggested_action(&self) -> SuggestedAction {
        match self {
            Error::InvalidThreshold { .. }
            | Error::InvalidSignificance { .. }
            | Error::InvalidGrid(_) => SuggestedAction::FixInput,

            Error::DegenerateSystem { .. } | Error::NonConvergence { .. } => {
                SuggestedAction::Recalibrate
            }

            Error::OutOfRangeResult { .. } => SuggestedAction::ReviewResult,

            Error::Config(_) => SuggestedAction::RunCheck,

            Error::Io(_) => SuggestedAction::Retry,
            Error::Json(_) => SuggestedAction::ManualIntervention,
        }
    }

    /// Returns a human-readable remediation hint.
    pub fn remediation(&self) -> &'static str {
        match self {
            Error::InvalidThreshold { .. } => {
                "Thresholds are -2 log likelihood-ratio values and must be non-negative."
            }
            Error::InvalidSignificance { .. } => {
                "Pass the maximum local significance in standard deviations (Z >= 0)."
            }
            Error::InvalidGrid(_) => {
                "The surface must be a non-empty rectangular grid of finite values."
            }
            Error::DegenerateSystem { .. } => {
                "Measure the Euler characteristic at two different thresholds."
            }
            Error::NonConvergence { .. } => {
                "The calibration points are inconsistent with the model. Choose thresholds further apart or average more background surfaces."
            }
            Error::OutOfRangeResult { .. } => {
                "The asymptotic formula is outside its valid range. Check the calibration data, or rerun without --strict to inspect the result."
            }
            Error::Config(_) => {
                "Run 'lee2d check' to validate configuration, or check syntax in the config file."
            }
            Error::Io(_) => "Check that the file exists and is readable. Retry the operation.",
            Error::Json(_) => {
                "Invalid JSON in file. Check syntax with 'jq . <file>' or regenerate the file."
            }
        }
    }

    /// Returns a short headline for human-readable output.
    pub fn headline(&self) -> &'static str {
        match self {
            Error::InvalidThreshold { .. } => "Invalid Threshold",
            Error::InvalidSignificance { .. } => "Invalid Significance",
            Error::InvalidGrid(_) => "Invalid Surface Grid",
            Error::DegenerateSystem { .. } => "Degenerate Calibration",
            Error::NonConvergence { .. } => "Solver Did Not Converge",
            Error::OutOfRangeResult { .. } => "Result Out Of Range",
            Error::Config(_) => "Configuration Error",
            Error::Io(_) => "I/O Error",
            Error::Json(_) => "JSON Parse Error",
        }
    }
}

/// Structured error response for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Stable error code.
    pub code: u32,

    /// Error category for grouping.
    pub category: ErrorCategory,

    /// Human-readable error message.
    pub message: String,

    /// Whether the caller can resolve the error by changing inputs.
    pub recoverable: bool,

    /// Suggested action for automated callers.
    pub suggested_action: SuggestedAction,

    /// Offending inputs.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, serde_json::Value>,
}

impl From<&Error> for StructuredError {
    fn from(err: &Error) -> Self {
        let mut context = HashMap::new();

        match err {
            Error::InvalidThreshold { u } => {
                context.insert("u".to_string(), serde_json::json!(u));
            }
            Error::InvalidSignificance { z } => {
                context.insert("z".to_string(), serde_json::json!(z));
            }
            Error::DegenerateSystem { u1, u2 } => {
                context.insert("u1".to_string(), serde_json::json!(u1));
                context.insert("u2".to_string(), serde_json::json!(u2));
            }
            Error::NonConvergence {
                iterations,
                residual,
            } => {
                context.insert("iterations".to_string(), serde_json::json!(iterations));
                context.insert("residual".to_string(), serde_json::json!(residual));
            }
            Error::OutOfRangeResult { advisories } => {
                context.insert("advisories".to_string(), serde_json::json!(advisories));
            }
            _ => {}
        }

        StructuredError {
            code: err.code(),
            category: err.category(),
            message: err.to_string(),
            recoverable: err.is_recoverable(),
            suggested_action: err.suggested_action(),
            context,
        }
    }
}

impl StructuredError {
    /// Add additional context to the error.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.context.insert(key.into(), v);
        }
        self
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":{},"error":"serialization_failed"}}"#, self.code)
        })
    }
}

/// Result of a batch of independent computations that may partially fail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResult<T> {
    /// Successfully completed items.
    pub succeeded: Vec<T>,

    /// Failed items with their errors.
    pub failed: Vec<BatchError>,

    /// Summary statistics.
    pub summary: BatchSummary,
}

/// A single error in a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchError {
    /// Index or identifier of the failed item.
    pub item_id: String,

    /// The structured error.
    pub error: StructuredError,
}

/// Summary of batch results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub all_succeeded: bool,
    pub any_succeeded: bool,
}

impl<T> BatchResult<T> {
    /// Create a new batch result from succeeded and failed items.
    pub fn new(succeeded: Vec<T>, failed: Vec<BatchError>) -> Self {
        let total = succeeded.len() + failed.len();
        let succeeded_count = succeeded.len();
        let failed_count = failed.len();

        BatchResult {
            succeeded,
            failed,
            summary: BatchSummary {
                total,
                succeeded: succeeded_count,
                failed: failed_count,
                all_succeeded: failed_count == 0,
                any_succeeded: succeeded_count > 0,
            },
        }
    }

    /// Add a failure to the batch result.
    pub fn add_failure(&mut self, item_id: impl Into<String>, error: &Error) {
        self.failed.push(BatchError {
            item_id: item_id.into(),
            error: StructuredError::from(error),
        });
        self.summary.failed += 1;
        self.summary.total += 1;
        self.summary.all_succeeded = false;
    }

    /// Add a success to the batch result.
    pub fn add_success(&mut self, item: T) {
        self.succeeded.push(item);
        self.summary.succeeded += 1;
        self.summary.total += 1;
        self.summary.any_succeeded = true;
    }
}

impl<T> Default for BatchResult<T> {
    fn default() -> Self {
        Self::new(Vec::new(), Vec::new())
    }
}

/// Format an error for human-readable stderr output.
///
/// Output format:
/// ```text
/// ✗ [Headline]
///   Reason: [Error message]
///   Fix: [Remediation hint]
/// ```
pub fn format_error_human(err: &Error, use_color: bool) -> String {
    let (red, cyan, reset) = if use_color {
        ("\x1b[31m", "\x1b[36m", "\x1b[0m")
    } else {
        ("", "", "")
    };

    format!(
        "{red}✗{reset} {headline}\n  Reason: {message}\n  {cyan}Fix:{reset} {remediation}",
        red = red,
        cyan = cyan,
        reset = reset,
        headline = err.headline(),
        message = err,
        remediation = err.remediation()
    )
}
