//! Configuration loading and typed config structures.
//!
//! The configuration lives in `regolith-config.yaml` next to the binary's
//! working directory. Every field has a default, so a missing file or a
//! partial one is fine.
//!
//! ```yaml
//! simulation:
//!   input_path: "input.txt"
//!   variant: floored
//! visualization:
//!   enabled: true
//!   address: "127.0.0.1:22143"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::runner::{RunOptions, Variant};

/// Environment variable overriding `simulation.input_path`.
pub const INPUT_ENV: &str = "REGOLITH_INPUT";

/// Environment variable overriding `visualization.address`.
pub const VISUALIZATION_ADDR_ENV: &str = "REGOLITH_VISUALIZATION_ADDR";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration, mirroring `regolith-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RegolithConfig {
    /// What to simulate.
    #[serde(default)]
    pub simulation: SimulationConfig,

    /// The replay service.
    #[serde(default)]
    pub visualization: VisualizationConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl RegolithConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `REGOLITH_INPUT` overrides `simulation.input_path`
    /// - `REGOLITH_VISUALIZATION_ADDR` overrides `visualization.address`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Like [`from_file`](Self::from_file), but a missing file yields the
    /// defaults (with environment overrides still applied).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for any failure other than the file not
    /// existing.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::parse(&contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file, using defaults");
                let mut config = Self::default();
                config.apply_env_overrides();
                Ok(config)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup(INPUT_ENV) {
            self.simulation.input_path = PathBuf::from(val);
        }
        if let Some(val) = lookup(VISUALIZATION_ADDR_ENV) {
            self.visualization.address = val;
        }
    }

    /// Run options implied by this configuration.
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            verify_invariants: self.simulation.verify_invariants,
            checkpoint_interval: self
                .visualization
                .enabled
                .then_some(self.visualization.checkpoint_interval),
        }
    }
}

/// Simulation settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SimulationConfig {
    /// Wall description file.
    #[serde(default = "default_input_path")]
    pub input_path: PathBuf,

    /// Which puzzle to solve.
    #[serde(default)]
    pub variant: Variant,

    /// Run the cave verification pass after every physics transition.
    #[serde(default)]
    pub verify_invariants: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            input_path: default_input_path(),
            variant: Variant::default(),
            verify_invariants: false,
        }
    }
}

/// Replay service settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VisualizationConfig {
    /// Record a timeline and serve it after the run.
    #[serde(default)]
    pub enabled: bool,

    /// Socket address to listen on.
    #[serde(default = "default_address")]
    pub address: String,

    /// Snapshots between forced checkpoints.
    #[serde(default = "default_checkpoint_interval")]
    pub checkpoint_interval: usize,

    /// Pause before reopening the listener after a transport error.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for VisualizationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            address: default_address(),
            checkpoint_interval: default_checkpoint_interval(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_input_path() -> PathBuf {
    PathBuf::from("input.txt")
}

fn default_address() -> String {
    String::from("0.0.0.0:22143")
}

const fn default_checkpoint_interval() -> usize {
    regolith_events::DEFAULT_CHECKPOINT_INTERVAL
}

const fn default_retry_delay_ms() -> u64 {
    100
}

fn default_log_level() -> String {
    String::from("info")
}
