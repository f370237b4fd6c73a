//! Configuration loading and validation for lee2d.
//!
//! This crate provides:
//! - Typed structs for the solver and report settings
//! - Config resolution (CLI → env → XDG → defaults)
//! - Semantic validation
//! - Config snapshots for reproducible results

pub mod resolve;
pub mod settings;
pub mod snapshot;
pub mod validate;

pub use resolve::{load_config, resolve_config, ConfigPath, ConfigSource, ResolvedConfig};
pub use settings::{LeeConfig, ReportSettings, SolverSettings};
pub use snapshot::ConfigSnapshot;
pub use validate::{validate_config, ValidationError, ValidationResult};

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";
