//! Configuration loading and typed config structures for the sunfleet server.
//!
//! The canonical configuration lives in `sunfleet-config.yaml` in the
//! working directory. Every section is optional; omitted fields fall back
//! to the defaults below.

use std::path::Path;

use serde::Deserialize;
use sunfleet_types::Plant;

use crate::catalog::{CatalogError, PlantCatalog};

/// Shortest accepted broadcast period.
pub const MIN_TICK_INTERVAL_MS: u64 = 100;

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

/// Top-level server configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FleetConfig {
    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Tick and broadcast settings.
    #[serde(default)]
    pub simulation: BroadcastConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Replacement plant list. The built-in fleet is used when absent.
    #[serde(default)]
    pub plants: Option<Vec<Plant>>,
}

impl FleetConfig {
    /// Load configuration from a YAML file and apply environment overrides.
    ///
    /// - `HOST` overrides `server.host`
    /// - `PORT` overrides `server.port`
    /// - `SUNFLEET_TICK_INTERVAL_MS` overrides `simulation.tick_interval_ms`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML string. No environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Apply `HOST`, `PORT`, and `SUNFLEET_TICK_INTERVAL_MS`.
    ///
    /// Values that fail to parse are ignored.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("HOST") {
            self.server.host = val;
        }
        if let Some(port) = std::env::var("PORT").ok().and_then(|v| v.parse().ok()) {
            self.server.port = port;
        }
        if let Some(ms) = std::env::var("SUNFLEET_TICK_INTERVAL_MS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.simulation.tick_interval_ms = ms;
        }
    }

    /// Build the plant catalog: the configured list, or the built-in fleet.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if the configured list is empty or has
    /// duplicate ids.
    pub fn catalog(&self) -> Result<PlantCatalog, CatalogError> {
        self.plants
            .as_ref()
            .map_or_else(|| Ok(PlantCatalog::builtin()), |plants| PlantCatalog::new(plants.clone()))
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    /// Bind address.
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Tick and broadcast settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BroadcastConfig {
    /// Real-time milliseconds between broadcast cycles.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Ticks per simulated day (48 = 30-minute steps).
    #[serde(default = "default_ticks_per_day")]
    pub ticks_per_day: u64,

    /// Frames buffered per subscriber before frames are dropped.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl BroadcastConfig {
    /// Broadcast period, never shorter than [`MIN_TICK_INTERVAL_MS`].
    pub fn tick_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.tick_interval_ms.max(MIN_TICK_INTERVAL_MS))
    }
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            ticks_per_day: default_ticks_per_day(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_port() -> u16 {
    3001
}

const fn default_tick_interval_ms() -> u64 {
    3000
}

const fn default_ticks_per_day() -> u64 {
    48
}

const fn default_channel_capacity() -> usize {
    16
}

fn default_log_level() -> String {
    "info".to_owned()
}
