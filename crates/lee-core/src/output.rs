//! Rendering of command results as JSON, Markdown or one-line summaries.
//!
//! JSON output wraps every result in an envelope:
//!
//! ```json
//! {
//!   "schema_version": "1.0.0",
//!   "run_id": "run-0123456789ab",
//!   "generated_at": "2026-01-15T14:30:22Z",
//!   "command": "correct",
//!   "status": "ok",
//!   "config": { ... },
//!   "result": { ... }
//! }
//! ```
//!
//! Non-finite numbers (a NaN global significance) serialize as `null`.

use lee_common::error::format_error_human;
use lee_common::{Advisory, BatchResult, Error, OutputFormat, StructuredError, SCHEMA_VERSION};
use lee_config::{ConfigSnapshot, ReportSettings};
use serde::Serialize;
use std::fmt::Write as _;

use crate::calibrate::Calibration;
use crate::correct::{ChannelCorrection, LeeCorrection};
use crate::euler::{CoefficientFit, EulerCounts};
use crate::surface::Peak;

/// Per-invocation metadata shared by all rendered outputs.
#[derive(Debug, Clone)]
pub struct RunInfo {
    pub run_id: String,
    pub command: String,
    pub config: ConfigSnapshot,
    pub precision: usize,
}

/// Human renderings of a result.
pub trait Render {
    fn markdown(&self, precision: usize) -> String;
    fn summary(&self, precision: usize) -> String;

    fn advisories(&self) -> Vec<Advisory> {
        Vec::new()
    }
}

/// `ok` or `advisory`.
pub fn status_of<T: Render>(value: &T) -> &'static str {
    if value.advisories().is_empty() {
        "ok"
    } else {
        "advisory"
    }
}

/// Render `value` for stdout in the requested format.
pub fn render<T: Render + Serialize>(
    format: OutputFormat,
    info: &RunInfo,
    value: &T,
) -> Result<String, Error> {
    match format {
        OutputFormat::Json => {
            let envelope = serde_json::json!({
                "schema_version": SCHEMA_VERSION,
                "run_id": info.run_id,
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "command": info.command,
                "status": status_of(value),
                "config": info.config,
                "result": value,
            });
            Ok(serde_json::to_string_pretty(&envelope)?)
        }
        OutputFormat::Md => Ok(value.markdown(info.precision)),
        OutputFormat::Summary => Ok(format!("[{}] {}", info.run_id, value.summary(info.precision))),
    }
}

/// Render an error for stderr in the requested format.
pub fn render_error(format: OutputFormat, run_id: &str, command: &str, err: &Error) -> String {
    match format {
        OutputFormat::Json => {
            let envelope = serde_json::json!({
                "schema_version": SCHEMA_VERSION,
                "run_id": run_id,
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "command": command,
                "status": "error",
                "error": StructuredError::from(err),
            });
            serde_json::to_string_pretty(&envelope)
                .unwrap_or_else(|_| StructuredError::from(err).to_json())
        }
        OutputFormat::Summary => format!("[{}] {} error: {}", run_id, command, err),
        OutputFormat::Md => format_error_human(err, false),
    }
}

/// Format `x` with `precision` significant digits.
pub fn fmt_sig(x: f64, precision: usize) -> String {
    if !x.is_finite() {
        return x.to_string();
    }
    if x == 0.0 {
        return "0".to_string();
    }
    let precision = precision.max(1);
    let magnitude = x.abs().log10().floor() as i32;
    if (-4..6).contains(&magnitude) {
        let decimals = (precision as i32 - 1 - magnitude).max(0) as usize;
        format!("{:.*}", decimals, x)
    } else {
        format!("{:.*e}", precision - 1, x)
    }
}

/// Euler characteristic of one surface at one threshold.
#[derive(Debug, Clone, Serialize)]
pub struct EulerReport {
    pub threshold: f64,
    pub rows: usize,
    pub cols: usize,
    pub peak: Peak,
    pub counts: EulerCounts,
}

impl Render for EulerReport {
    fn markdown(&self, precision: usize) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# Excursion Set above u = {}", fmt_sig(self.threshold, precision));
        let _ = writeln!(out);
        let _ = writeln!(out, "Grid: {} x {}", self.rows, self.cols);
        let _ = writeln!(
            out,
            "Peak: q = {} at row {}, column {}",
            fmt_sig(self.peak.value, precision),
            self.peak.row,
            self.peak.col
        );
        let _ = writeln!(out);
        let _ = writeln!(out, "| vertices | edges | faces | euler |");
        let _ = writeln!(out, "|---------:|------:|------:|------:|");
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} |",
            self.counts.vertices, self.counts.edges, self.counts.faces, self.counts.euler
        );
        out
    }

    fn summary(&self, precision: usize) -> String {
        format!(
            "euler(u={}) {}",
            fmt_sig(self.threshold, precision),
            self.counts
        )
    }
}

/// Measured calibration and the coefficients fitted to it.
#[derive(Debug, Clone, Serialize)]
pub struct CalibrationReport {
    pub surfaces: usize,
    pub calibration: Calibration,
    pub fit: CoefficientFit,
}

impl Render for CalibrationReport {
    fn markdown(&self, precision: usize) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# Calibration ({} surfaces)", self.surfaces);
        let _ = writeln!(out);
        let _ = writeln!(out, "| u | E[phi] | std. error |");
        let _ = writeln!(out, "|--:|-------:|-----------:|");
        for point in [&self.calibration.first, &self.calibration.second] {
            let _ = writeln!(
                out,
                "| {} | {} | {} |",
                fmt_sig(point.threshold, precision),
                fmt_sig(point.euler, precision),
                fmt_sig(point.std_error, precision)
            );
        }
        let _ = writeln!(out);
        write_fit(&mut out, &self.fit, precision);
        write_advisories(&mut out, &self.fit.advisories);
        out
    }

    fn summary(&self, precision: usize) -> String {
        format!(
            "calibrate: n1={} n2={} ({} surfaces)",
            fmt_sig(self.fit.coefficients.n1, precision),
            fmt_sig(self.fit.coefficients.n2, precision),
            self.surfaces
        )
    }

    fn advisories(&self) -> Vec<Advisory> {
        self.fit.advisories.clone()
    }
}

fn write_fit(out: &mut String, fit: &CoefficientFit, precision: usize) {
    let _ = writeln!(
        out,
        "Coefficients: n1 = {}, n2 = {}",
        fmt_sig(fit.coefficients.n1, precision),
        fmt_sig(fit.coefficients.n2, precision)
    );
    let _ = writeln!(
        out,
        "Solver: {} iterations, residual {}",
        fit.iterations,
        fmt_sig(fit.residual, 3)
    );
}

fn write_advisories(out: &mut String, advisories: &[Advisory]) {
    if advisories.is_empty() {
        return;
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "## Advisories");
    let _ = writeln!(out);
    for advisory in advisories {
        let _ = writeln!(out, "- {}", advisory);
    }
}

impl Render for LeeCorrection {
    fn markdown(&self, precision: usize) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# Look-Elsewhere Correction");
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "Coefficients: n1 = {}, n2 = {}",
            fmt_sig(self.coefficients.n1, precision),
            fmt_sig(self.coefficients.n2, precision)
        );
        let _ = writeln!(out);
        let _ = writeln!(out, "|        | p-value | significance |");
        let _ = writeln!(out, "|--------|--------:|-------------:|");
        let _ = writeln!(
            out,
            "| local  | {} | {} |",
            fmt_sig(self.local_p_value, precision),
            fmt_sig(self.local_significance, precision)
        );
        let _ = writeln!(
            out,
            "| global | {} | {} |",
            fmt_sig(self.global_p_value, precision),
            fmt_sig(self.global_significance, precision)
        );
        let _ = writeln!(out);
        let _ = writeln!(out, "Trials factor: {}", fmt_sig(self.trials_factor, precision));
        write_advisories(&mut out, &self.advisories);
        out
    }

    fn summary(&self, precision: usize) -> String {
        format!(
            "local Z={} p={} -> global Z={} p={}",
            fmt_sig(self.local_significance, precision),
            fmt_sig(self.local_p_value, precision),
            fmt_sig(self.global_significance, precision),
            fmt_sig(self.global_p_value, precision)
        )
    }

    fn advisories(&self) -> Vec<Advisory> {
        self.advisories.clone()
    }
}

impl Render for BatchResult<ChannelCorrection> {
    fn markdown(&self, precision: usize) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# Look-Elsewhere Correction ({} channels)", self.summary.total);
        let _ = writeln!(out);
        let _ = writeln!(out, "| channel | local Z | global p | global Z |");
        let _ = writeln!(out, "|---------|--------:|---------:|---------:|");
        for item in &self.succeeded {
            let c = &item.correction;
            let _ = writeln!(
                out,
                "| {} | {} | {} | {} |",
                item.channel,
                fmt_sig(c.local_significance, precision),
                fmt_sig(c.global_p_value, precision),
                fmt_sig(c.global_significance, precision)
            );
        }
        if !self.failed.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "## Failed");
            let _ = writeln!(out);
            for failure in &self.failed {
                let _ = writeln!(out, "- {}: {}", failure.item_id, failure.error.message);
            }
        }
        write_advisories(&mut out, &Render::advisories(self));
        out
    }

    fn summary(&self, _precision: usize) -> String {
        format!(
            "correct: {}/{} channels ok",
            self.summary.succeeded, self.summary.total
        )
    }

    fn advisories(&self) -> Vec<Advisory> {
        self.succeeded
            .iter()
            .flat_map(|c| c.correction.advisories.iter().copied())
            .collect()
    }
}

/// Resolved configuration as reported by `lee2d check`.
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub valid: bool,
    pub snapshot: ConfigSnapshot,
    pub report: ReportSettings,
}

impl Render for CheckReport {
    fn markdown(&self, precision: usize) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# Configuration Validation");
        let _ = writeln!(out);
        let _ = writeln!(out, "Status: valid");
        match &self.snapshot.config_path {
            Some(path) => {
                let _ = writeln!(out, "Config: {} ({})", path, self.snapshot.config_source);
            }
            None => {
                let _ = writeln!(out, "Config: using built-in defaults");
            }
        }
        let _ = writeln!(out, "Hash: {}", self.snapshot.short_id());
        let solver = &self.snapshot.solver;
        let _ = writeln!(
            out,
            "Solver: start ({}, {}), max {} iterations, tolerance {}",
            fmt_sig(solver.initial_guess[0], precision),
            fmt_sig(solver.initial_guess[1], precision),
            solver.max_iterations,
            fmt_sig(solver.tolerance, 3)
        );
        let _ = writeln!(
            out,
            "Report: strict={}, precision={}",
            self.report.strict, self.report.precision
        );
        out
    }

    fn summary(&self, _precision: usize) -> String {
        format!("config check: OK ({})", self.snapshot.config_source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correct::do_lee_correction;
    use crate::euler::expected_euler;
    use lee_config::{ConfigSource, LeeConfig, ResolvedConfig};

    fn info() -> RunInfo {
        let resolved = ResolvedConfig {
            config: LeeConfig::default(),
            path: None,
            source: ConfigSource::BuiltinDefault,
            hash: None,
        };
        RunInfo {
            run_id: "run-test".to_string(),
            command: "correct".to_string(),
            config: ConfigSnapshot::new(&resolved),
            precision: 4,
        }
    }

    fn correction(z: f64) -> LeeCorrection {
        let phi1 = expected_euler(1.0, 0.5, 0.8).unwrap();
        let phi2 = expected_euler(4.0, 0.5, 0.8).unwrap();
        do_lee_correction(z, 1.0, 4.0, phi1, phi2).unwrap()
    }

    #[test]
    fn fmt_sig_uses_significant_digits() {
        assert_eq!(fmt_sig(0.034915886, 4), "0.03492");
        assert_eq!(fmt_sig(1.8130003, 4), "1.813");
        assert_eq!(fmt_sig(123.456, 2), "123");
        assert_eq!(fmt_sig(1.2e-9, 3), "1.20e-9");
        assert_eq!(fmt_sig(0.0, 6), "0");
        assert_eq!(fmt_sig(f64::NAN, 6), "NaN");
    }

    #[test]
    fn json_envelope_wraps_result() {
        let out = render(OutputFormat::Json, &info(), &correction(3.0)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["schema_version"], SCHEMA_VERSION);
        assert_eq!(value["status"], "ok");
        assert_eq!(value["command"], "correct");
        assert_eq!(value["result"]["threshold"], 9.0);
        assert!(value["config"]["config_hash"].is_string());
    }

    #[test]
    fn nan_significance_is_null_and_status_is_advisory() {
        let out = render(OutputFormat::Json, &info(), &correction(0.5)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["status"], "advisory");
        assert!(value["result"]["global_significance"].is_null());
        assert_eq!(value["result"]["advisories"][0]["kind"], "p_value_out_of_range");
    }

    #[test]
    fn markdown_and_summary() {
        let c = correction(3.0);
        let md = render(OutputFormat::Md, &info(), &c).unwrap();
        assert!(md.starts_with("# Look-Elsewhere Correction"));
        assert!(md.contains("| global | 0.03492 | 1.813 |"), "{md}");

        let summary = render(OutputFormat::Summary, &info(), &c).unwrap();
        assert_eq!(summary, "[run-test] local Z=3.000 p=0.001350 -> global Z=1.813 p=0.03492");
    }

    #[test]
    fn error_rendering() {
        let err = Error::DegenerateSystem { u1: 4.0, u2: 4.0 };
        let json = render_error(OutputFormat::Json, "run-x", "correct", &err);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["status"], "error");
        assert_eq!(value["error"]["code"], 20);

        let human = render_error(OutputFormat::Md, "run-x", "correct", &err);
        assert!(human.contains("Degenerate Calibration"));
    }
}
