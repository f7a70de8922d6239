//! Cosign configuration file handling
//!
//! Provides default configuration generation and loading for the cosign CLI.
//! Configuration files are TOML and live under the platform data directory
//! by default (e.g. ~/.local/share/cosign/config.toml).
//!
//! The config only covers OPERATOR concerns (where state lives, logging).
//! Who must approve what is decided per proposal, never here.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default log level
const DEFAULT_LOG_LEVEL: &str = "info";

/// Cosign CLI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CosignConfig {
    /// State file configuration
    pub state: StateConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where proposals, approvals and invalidations are persisted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateConfig {
    /// Path to the CBOR state file
    pub path: PathBuf,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or filter directive (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    pub file: Option<PathBuf>,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            file: None,
        }
    }
}

impl CosignConfig {
    /// Create a new configuration with the given state path
    pub fn new(state_path: PathBuf) -> Self {
        Self {
            state: StateConfig { path: state_path },
            logging: LoggingConfig::default(),
        }
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file '{}': {}", path.display(), e))?;

        let config: CosignConfig = toml::from_str(&contents)
            .map_err(|e| format!("Failed to parse config file '{}': {}", path.display(), e))?;

        Ok(config)
    }

    /// Load `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::new(default_state_path()))
        }
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;

        // Create parent directory if needed
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }

        fs::write(path, contents)
            .map_err(|e| format!("Failed to write config file '{}': {}", path.display(), e))?;

        Ok(())
    }

    /// Generate default configuration content as a string with comments
    pub fn generate_default_toml(state_path: &Path) -> String {
        format!(
            r#"# Cosign Configuration
#
# Operator settings only. The authorities required to approve a transaction
# are chosen per proposal (cosign propose --requested ...), not here.

[state]
# CBOR file holding proposals, approvals, invalidations and the deferred queue
path = "{state_path}"

[logging]
# Log level: trace, debug, info, warn, error (RUST_LOG overrides this)
level = "info"

# Log file path (optional, logs to stderr if not specified)
# file = "/var/log/cosign/cosign.log"
"#,
            state_path = state_path.display()
        )
    }

    /// Create and save a default configuration file
    pub fn create_default(
        config_path: &Path,
        state_path: &Path,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let contents = Self::generate_default_toml(state_path);

        // Create parent directory if needed
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }

        fs::write(config_path, contents).map_err(|e| {
            format!(
                "Failed to write config file '{}': {}",
                config_path.display(),
                e
            )
        })?;

        Ok(())
    }
}

fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cosign")
}

/// Default config path: ~/.local/share/cosign/config.toml
pub fn default_config_path() -> PathBuf {
    data_dir().join("config.toml")
}

/// Default state path: ~/.local/share/cosign/state.cbor
pub fn default_state_path() -> PathBuf {
    data_dir().join("state.cbor")
}
