//! Exit codes for the lee2d CLI.
//!
//! Exit codes communicate the outcome without requiring output parsing.
//!
//! Exit code ranges:
//! - 0-9: Operational outcomes (a result was produced)
//! - 10-19: User/input errors (recoverable by changing inputs)
//! - 20-29: Internal and I/O errors

use lee_common::Error;

/// Exit codes for lee2d operations.
///
/// These codes are a stable contract for automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    // Operational outcomes (0-9)
    /// Result produced, no advisories.
    Clean = 0,

    /// Result produced with advisories (negative coefficients, p-value out of range).
    Advisory = 1,

    /// Some channels of a batch failed.
    PartialFail = 2,

    // User / input errors (10-19)
    /// Invalid arguments or input values.
    ArgsError = 10,

    /// Configuration could not be loaded or failed validation.
    ConfigError = 11,

    /// Calibration thresholds coincide or the system is singular.
    DegenerateCalibration = 12,

    /// Coefficient solver exhausted its iteration budget.
    NonConvergence = 13,

    /// Advisory escalated by --strict.
    OutOfRange = 14,

    // Internal errors (20-29)
    /// Internal error (bug - please report)
    InternalError = 20,

    /// File could not be read or parsed.
    IoError = 21,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the code name as a string constant (for JSON output).
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Clean => "OK_CLEAN",
            ExitCode::Advisory => "OK_ADVISORY",
            ExitCode::PartialFail => "ERR_PARTIAL",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::ConfigError => "ERR_CONFIG",
            ExitCode::DegenerateCalibration => "ERR_DEGENERATE",
            ExitCode::NonConvergence => "ERR_NON_CONVERGENCE",
            ExitCode::OutOfRange => "ERR_OUT_OF_RANGE",
            ExitCode::InternalError => "ERR_INTERNAL",
            ExitCode::IoError => "ERR_IO",
        }
    }
}

impl From<&Error> for ExitCode {
    fn from(err: &Error) -> Self {
        match err {
            Error::InvalidThreshold { .. }
            | Error::InvalidSignificance { .. }
            | Error::InvalidGrid(_) => ExitCode::ArgsError,
            Error::DegenerateSystem { .. } => ExitCode::DegenerateCalibration,
            Error::NonConvergence { .. } => ExitCode::NonConvergence,
            Error::OutOfRangeResult { .. } => ExitCode::OutOfRange,
            Error::Config(_) => ExitCode::ConfigError,
            Error::Io(_) | Error::Json(_) => ExitCode::IoError,
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_values_are_stable() {
        assert_eq!(ExitCode::Clean.as_i32(), 0);
        assert_eq!(ExitCode::Advisory.as_i32(), 1);
        assert_eq!(ExitCode::ArgsError.as_i32(), 10);
        assert_eq!(ExitCode::ConfigError.as_i32(), 11);
        assert_eq!(ExitCode::DegenerateCalibration.as_i32(), 12);
        assert_eq!(ExitCode::NonConvergence.as_i32(), 13);
        assert_eq!(ExitCode::OutOfRange.as_i32(), 14);
        assert_eq!(ExitCode::InternalError.as_i32(), 20);
        assert_eq!(ExitCode::IoError.as_i32(), 21);
    }

    #[test]
    fn test_from_error() {
        assert_eq!(
            ExitCode::from(&Error::DegenerateSystem { u1: 1.0, u2: 1.0 }),
            ExitCode::DegenerateCalibration
        );
        assert_eq!(
            ExitCode::from(&Error::InvalidSignificance { z: -1.0 }),
            ExitCode::ArgsError
        );
        assert_eq!(
            ExitCode::from(&Error::OutOfRangeResult { advisories: vec![] }),
            ExitCode::OutOfRange
        );
        assert_eq!(ExitCode::from(&Error::Config("x".into())), ExitCode::ConfigError);
    }

    #[test]
    fn test_display() {
        assert_eq!(ExitCode::NonConvergence.to_string(), "ERR_NON_CONVERGENCE (13)");
    }
}
