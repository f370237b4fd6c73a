//! Configuration resolution and loading.
//!
//! Resolution order: CLI argument → environment variables → XDG paths →
//! system path → built-in defaults.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::settings::LeeConfig;
use crate::validate::{validate_config, ValidationError, ValidationResult};

/// Where the configuration file was found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicitly provided via CLI argument.
    CliArgument,

    /// Set via environment variable.
    Environment,

    /// Found in XDG config directory.
    XdgConfig,

    /// Found in /etc/lee2d/.
    SystemConfig,

    /// Using built-in defaults.
    #[default]
    BuiltinDefault,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::CliArgument => write!(f, "CLI argument"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::XdgConfig => write!(f, "XDG config"),
            ConfigSource::SystemConfig => write!(f, "system config"),
            ConfigSource::BuiltinDefault => write!(f, "builtin default"),
        }
    }
}

/// A resolved configuration path (None when defaults apply).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigPath {
    pub path: Option<PathBuf>,
    pub source: ConfigSource,
}

/// Environment variable names.
pub const ENV_CONFIG_PATH: &str = "LEE2D_CONFIG";
pub const ENV_CONFIG_DIR: &str = "LEE2D_CONFIG_DIR";

/// Standard config file name.
const CONFIG_FILENAME: &str = "config.json";

/// Application name for XDG directories.
const APP_NAME: &str = "lee2d";

/// Resolve the configuration path.
///
/// 1. Explicit CLI path (always wins; a missing file is a load error)
/// 2. `LEE2D_CONFIG` (direct path)
/// 3. `LEE2D_CONFIG_DIR` + `config.json`
/// 4. XDG config directory (`~/.config/lee2d/config.json`)
/// 5. System config (`/etc/lee2d/config.json`)
/// 6. Built-in defaults (None)
pub fn resolve_config(cli_path: Option<&Path>) -> ConfigPath {
    if let Some(path) = cli_path {
        return ConfigPath {
            path: Some(path.to_path_buf()),
            source: ConfigSource::CliArgument,
        };
    }

    if let Ok(env_path) = std::env::var(ENV_CONFIG_PATH) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return ConfigPath {
                path: Some(path),
                source: ConfigSource::Environment,
            };
        }
    }

    if let Ok(config_dir) = std::env::var(ENV_CONFIG_DIR) {
        let path = PathBuf::from(config_dir).join(CONFIG_FILENAME);
        if path.exists() {
            return ConfigPath {
                path: Some(path),
                source: ConfigSource::Environment,
            };
        }
    }

    if let Some(dir) = xdg_config_dir() {
        let path = dir.join(CONFIG_FILENAME);
        if path.exists() {
            return ConfigPath {
                path: Some(path),
                source: ConfigSource::XdgConfig,
            };
        }
    }

    let system_path = system_config_dir().join(CONFIG_FILENAME);
    if system_path.exists() {
        return ConfigPath {
            path: Some(system_path),
            source: ConfigSource::SystemConfig,
        };
    }

    ConfigPath::default()
}

/// Get the XDG config directory for lee2d.
pub fn xdg_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

/// Get the system config directory.
pub fn system_config_dir() -> PathBuf {
    PathBuf::from("/etc").join(APP_NAME)
}

/// Loaded and validated configuration with provenance.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub config: LeeConfig,
    pub path: Option<PathBuf>,
    pub source: ConfigSource,
    /// SHA-256 of the file content (None when using defaults).
    pub hash: Option<String>,
}

/// Resolve, read, parse and validate the configuration.
pub fn load_config(cli_path: Option<&Path>) -> ValidationResult<ResolvedConfig> {
    let resolved = resolve_config(cli_path);

    let Some(path) = resolved.path else {
        let config = LeeConfig::default();
        validate_config(&config)?;
        return Ok(ResolvedConfig {
            config,
            path: None,
            source: ConfigSource::BuiltinDefault,
            hash: None,
        });
    };

    let content = std::fs::read_to_string(&path).map_err(|e| {
        ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
    })?;
    let config = LeeConfig::from_json(&content)?;
    validate_config(&config)?;

    Ok(ResolvedConfig {
        config,
        hash: Some(hash_content(&content)),
        path: Some(path),
        source: resolved.source,
    })
}

/// Compute SHA-256 hash of content.
pub fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_source_display() {
        assert_eq!(format!("{}", ConfigSource::CliArgument), "CLI argument");
        assert_eq!(
            format!("{}", ConfigSource::Environment),
            "environment variable"
        );
        assert_eq!(format!("{}", ConfigSource::XdgConfig), "XDG config");
        assert_eq!(format!("{}", ConfigSource::BuiltinDefault), "builtin default");
    }

    #[test]
    fn test_cli_path_wins_even_if_missing() {
        let path = Path::new("/nonexistent/lee2d/config.json");
        let resolved = resolve_config(Some(path));
        assert_eq!(resolved.source, ConfigSource::CliArgument);
        assert_eq!(resolved.path.as_deref(), Some(path));
    }

    #[test]
    fn test_missing_cli_path_is_io_error() {
        let err = load_config(Some(Path::new("/nonexistent/lee2d/config.json"))).unwrap_err();
        assert!(matches!(err, ValidationError::IoError(_)));
    }

    #[test]
    fn test_hash_is_stable_hex() {
        let a = hash_content("{}");
        assert_eq!(a.len(), 64);
        assert_eq!(a, hash_content("{}"));
        assert_ne!(a, hash_content("{ }"));
    }
}
