//! Advisory flags for results the asymptotic formula may not support.
//!
//! The Euler-characteristic approximation can legitimately produce negative
//! coefficients or "p-values" outside `[0, 1]`. These are reported rather than
//! clamped so calibration problems stay visible.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A non-fatal warning attached to a computed result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Advisory {
    /// The fitted shape coefficients are outside `n1 >= 0, n2 >= 0`.
    NegativeCoefficients { n1: f64, n2: f64 },
    /// The global p-value fell outside `[0, 1]`.
    PValueOutOfRange { p_value: f64 },
}

impl Advisory {
    /// Stable machine name.
    pub fn code_name(&self) -> &'static str {
        match self {
            Advisory::NegativeCoefficients { .. } => "negative_coefficients",
            Advisory::PValueOutOfRange { .. } => "p_value_out_of_range",
        }
    }
}

impl std::fmt::Display for Advisory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Advisory::NegativeCoefficients { n1, n2 } => {
                write!(f, "negative shape coefficients (n1={n1}, n2={n2})")
            }
            Advisory::PValueOutOfRange { p_value } => {
                write!(f, "global p-value {p_value} outside [0, 1]")
            }
        }
    }
}

/// Join advisories into a single line for error messages.
pub fn describe_all(advisories: &[Advisory]) -> String {
    if advisories.is_empty() {
        return "no advisories".to_string();
    }
    advisories
        .iter()
        .map(|a| a.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Flags for a fitted coefficient pair.
pub fn check_coefficients(n1: f64, n2: f64) -> Option<Advisory> {
    if n1 < 0.0 || n2 < 0.0 {
        Some(Advisory::NegativeCoefficients { n1, n2 })
    } else {
        None
    }
}

/// Flags for a global p-value.
pub fn check_p_value(p_value: f64) -> Option<Advisory> {
    if p_value.is_nan() || !(0.0..=1.0).contains(&p_value) {
        Some(Advisory::PValueOutOfRange { p_value })
    } else {
        None
    }
}
