//! Configuration snapshots attached to results for reproducibility.
//!
//! A snapshot captures the exact solver configuration used for a
//! computation, so a reported global p-value can be reproduced later.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::resolve::{hash_content, ResolvedConfig};
use crate::settings::SolverSettings;

/// A frozen snapshot of configuration state.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ConfigSnapshot {
    /// When this snapshot was taken.
    pub timestamp: DateTime<Utc>,

    /// Schema version of the configuration.
    pub schema_version: String,

    /// Path the configuration was loaded from.
    #[serde(default)]
    pub config_path: Option<String>,

    /// Source of the configuration.
    pub config_source: String,

    /// SHA-256 of the config file, or of the serialized defaults.
    pub config_hash: String,

    /// Solver settings in effect.
    pub solver: SolverSettings,

    /// Whether advisories were escalated to errors.
    pub strict: bool,
}

impl ConfigSnapshot {
    /// Create a snapshot from a resolved configuration.
    pub fn new(resolved: &ResolvedConfig) -> Self {
        let config_hash = match &resolved.hash {
            Some(hash) => hash.clone(),
            None => hash_content(&serde_json::to_string(&resolved.config).unwrap_or_default()),
        };

        ConfigSnapshot {
            timestamp: Utc::now(),
            schema_version: resolved.config.schema_version.clone(),
            config_path: resolved.path.as_ref().map(|p| p.display().to_string()),
            config_source: resolved.source.to_string(),
            config_hash,
            solver: resolved.config.solver,
            strict: resolved.config.report.strict,
        }
    }

    /// Serialize snapshot to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Check if this snapshot matches another (same config).
    pub fn matches(&self, other: &ConfigSnapshot) -> bool {
        self.config_hash == other.config_hash
    }

    /// Get a short identifier for this snapshot (first 12 chars of hash).
    pub fn short_id(&self) -> &str {
        &self.config_hash[..12.min(self.config_hash.len())]
    }
}
