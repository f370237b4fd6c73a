//! Shared types for the 2D look-elsewhere correction.
//!
//! This crate provides foundational types shared across lee-core modules:
//! - The error taxonomy with stable codes
//! - Advisory flags for out-of-range results
//! - Output format specifications

pub mod advisory;
pub mod error;
pub mod output;

pub use advisory::Advisory;
pub use error::{BatchResult, Error, ErrorCategory, Result, StructuredError, SuggestedAction};
pub use output::OutputFormat;

/// Schema version of serialized results.
pub const SCHEMA_VERSION: &str = "1.0.0";
