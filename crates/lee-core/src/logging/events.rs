//! Structured event definitions for logging.
//!
//! Events emitted through `log_event!` carry the run ID, the subcommand and
//! the pipeline stage; `JsonlLayer` lifts those to top-level keys.

use serde::{Deserialize, Serialize};

/// Log levels for events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE => Level::Trace,
            tracing::Level::DEBUG => Level::Debug,
            tracing::Level::INFO => Level::Info,
            tracing::Level::WARN => Level::Warn,
            tracing::Level::ERROR => Level::Error,
        }
    }
}

/// Stages of a look-elsewhere correction run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Startup and configuration.
    Init,
    /// Measuring Euler characteristics on surfaces.
    Calibrate,
    /// Fitting the shape coefficients.
    Solve,
    /// Converting local to global significance.
    Correct,
    /// Rendering the result.
    Report,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Init => "init",
            Stage::Calibrate => "calibrate",
            Stage::Solve => "solve",
            Stage::Correct => "correct",
            Stage::Report => "report",
        };
        write!(f, "{}", s)
    }
}

/// Standard event names used in logging.
pub mod event_names {
    // Run lifecycle
    pub const RUN_STARTED: &str = "run.started";
    pub const RUN_FINISHED: &str = "run.finished";

    // Config/init events
    pub const CONFIG_LOADED: &str = "config.loaded";
    pub const CONFIG_DEFAULT_USED: &str = "config.default_used";
    pub const CONFIG_ERROR: &str = "config.error";

    // Calibrate stage
    pub const SURFACE_LOADED: &str = "calibrate.surface_loaded";
    pub const EULER_MEASURED: &str = "calibrate.euler_measured";

    // Solve stage
    pub const SOLVE_STARTED: &str = "solve.started";
    pub const SOLVE_CONVERGED: &str = "solve.converged";
    pub const SOLVE_FAILED: &str = "solve.failed";

    // Correct stage
    pub const CORRECT_FINISHED: &str = "correct.finished";
    pub const ADVISORY_RAISED: &str = "correct.advisory";

    // Report stage
    pub const REPORT_WRITTEN: &str = "report.written";

    pub const INTERNAL_ERROR: &str = "internal_error";
}

/// Run ID and subcommand attached to every `log_event!`.
#[derive(Debug, Clone)]
pub struct LogContext {
    pub run_id: String,
    pub command: Option<String>,
}

impl LogContext {
    pub fn new(run_id: impl Into<String>) -> Self {
        LogContext {
            run_id: run_id.into(),
            command: None,
        }
    }

    /// Set the subcommand name.
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }
}
