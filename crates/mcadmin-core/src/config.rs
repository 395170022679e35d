//! Configuration loading and typed config structures for the Data API.
//!
//! The configuration lives in a kebab-case YAML file (`config.yml` by
//! default). This module defines strongly-typed structs that mirror that
//! file, a loader that reads and validates it, and the default file that
//! is written when none exists yet.
//!
//! The loaded [`DataApiConfig`] is immutable: the host builds it once at
//! startup and hands the relevant pieces to the HTTP layer and the
//! authority thread.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

/// The API key shipped in the default configuration file.
///
/// Running with this key logs a startup warning.
pub const DEFAULT_API_KEY: &str = "mcadmin-default-key-change-me";

/// Environment variable naming the configuration file.
pub const ENV_CONFIG_PATH: &str = "MCADMIN_CONFIG";

/// Configuration file used when `MCADMIN_CONFIG` is unset.
pub const DEFAULT_CONFIG_PATH: &str = "config.yml";

/// Environment variable overriding `api-key`.
pub const ENV_API_KEY: &str = "MCADMIN_API_KEY";

/// Environment variable overriding `port`.
pub const ENV_PORT: &str = "MCADMIN_PORT";

/// Contents written by [`DataApiConfig::write_default_if_missing`].
pub const DEFAULT_CONFIG_YAML: &str = r#"# MCAdmin Data API configuration

# Port the HTTP listener binds to.
port: 8080

# Shared secret expected in the X-API-Key header. Change this!
api-key: "mcadmin-default-key-change-me"

# Set to false to keep the HTTP listener from starting.
enabled: true

# Log the remote address of every accepted request.
log-requests: false

# Address the HTTP listener binds to.
host: "0.0.0.0"

# Pretty-print JSON responses.
pretty-json: true

# How long a request waits for the simulation thread, in milliseconds.
collection-timeout-ms: 1000

simulation:
  server-name: "CraftBukkit"
  tick-interval-ms: 50
  task-queue-capacity: 64
  demo-participants: 3
  seed: 42
"#;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read or write the configuration file.
    #[error("failed to access config file: {source}")]
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

    /// A value parsed but is not usable.
    #[error("invalid config value for `{key}`: {reason}")]
    Invalid {
        /// The offending key.
        key: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// The shared secret callers present in `X-API-Key`.
///
/// `Debug` never prints the value so the key cannot leak through logged
/// config dumps.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wrap a secret value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw secret.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Whether this is the well-known key from the default config file.
    pub fn is_default(&self) -> bool {
        self.0 == DEFAULT_API_KEY
    }
}

impl Default for ApiKey {
    fn default() -> Self {
        Self::new(DEFAULT_API_KEY)
    }
}

impl core::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

/// Top-level Data API configuration.
///
/// Mirrors the structure of `config.yml`. Every field has a default so a
/// partial file is valid.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DataApiConfig {
    /// TCP port for the HTTP listener.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Shared secret for `/api/players`.
    #[serde(default)]
    pub api_key: ApiKey,

    /// Whether the HTTP listener is started at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Whether accepted requests are logged with their remote address.
    #[serde(default)]
    pub log_requests: bool,

    /// Bind address for the HTTP listener.
    #[serde(default = "default_host")]
    pub host: String,

    /// Whether JSON responses are pretty-printed.
    #[serde(default = "default_true")]
    pub pretty_json: bool,

    /// Upper bound a request waits for the authority thread, in milliseconds.
    #[serde(default = "default_collection_timeout_ms")]
    pub collection_timeout_ms: u64,

    /// Simulation host settings.
    #[serde(default)]
    pub simulation: SimulationConfig,
}

impl Default for DataApiConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            api_key: ApiKey::default(),
            enabled: true,
            log_requests: false,
            host: default_host(),
            pretty_json: true,
            collection_timeout_ms: default_collection_timeout_ms(),
            simulation: SimulationConfig::default(),
        }
    }
}

impl DataApiConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override file values:
    /// - `MCADMIN_API_KEY` overrides `api-key`
    /// - `MCADMIN_PORT` overrides `port`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value fails validation.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Self = serde_yml::from_str(&contents)?;
        config.apply_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string without consulting the
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value fails validation.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Write [`DEFAULT_CONFIG_YAML`] to `path` unless a file already exists.
    ///
    /// Returns `true` when the file was created.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the directory or file cannot be created.
    pub fn write_default_if_missing(path: &Path) -> Result<bool, ConfigError> {
        if path.exists() {
            return Ok(false);
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, DEFAULT_CONFIG_YAML)?;
        Ok(true)
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// production).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `MCADMIN_PORT` is not a port number.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(ENV_API_KEY) {
            self.api_key = ApiKey::new(key);
        }
        if let Some(port) = lookup(ENV_PORT) {
            self.port = port.trim().parse().map_err(|e| ConfigError::Invalid {
                key: "port",
                reason: format!("{ENV_PORT}={port}: {e}"),
            })?;
        }
        Ok(())
    }

    /// Reject values that would leave the service unusable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.expose().is_empty() {
            return Err(ConfigError::Invalid {
                key: "api-key",
                reason: "must not be empty".to_owned(),
            });
        }
        if self.collection_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                key: "collection-timeout-ms",
                reason: "must be greater than zero".to_owned(),
            });
        }
        if self.simulation.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                key: "simulation.tick-interval-ms",
                reason: "must be greater than zero".to_owned(),
            });
        }
        if self.simulation.task_queue_capacity == 0 {
            return Err(ConfigError::Invalid {
                key: "simulation.task-queue-capacity",
                reason: "must be greater than zero".to_owned(),
            });
        }
        Ok(())
    }

    /// Whether the well-known default key is in use.
    pub fn uses_default_api_key(&self) -> bool {
        self.api_key.is_default()
    }

    /// Request-side wait budget for authority-thread work.
    pub const fn collection_timeout(&self) -> Duration {
        Duration::from_millis(self.collection_timeout_ms)
    }
}

/// Settings for the simulation the API reads from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SimulationConfig {
    /// Server identifier reported in every batch.
    #[serde(default = "default_server_name")]
    pub server_name: String,

    /// Real-time milliseconds per tick.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Capacity of the authority thread's job queue.
    #[serde(default = "default_task_queue_capacity")]
    pub task_queue_capacity: usize,

    /// Participants spawned into the demo world at startup.
    #[serde(default = "default_demo_participants")]
    pub demo_participants: u32,

    /// Random seed for the demo world.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            server_name: default_server_name(),
            tick_interval_ms: default_tick_interval_ms(),
            task_queue_capacity: default_task_queue_capacity(),
            demo_participants: default_demo_participants(),
            seed: default_seed(),
        }
    }
}

impl SimulationConfig {
    /// Tick period as a [`Duration`].
    pub const fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

const fn default_port() -> u16 {
    8080
}

fn default_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_collection_timeout_ms() -> u64 {
    1000
}

fn default_server_name() -> String {
    "CraftBukkit".to_owned()
}

const fn default_tick_interval_ms() -> u64 {
    50
}

const fn default_task_queue_capacity() -> usize {
    64
}

const fn default_demo_participants() -> u32 {
    3
}

const fn default_seed() -> u64 {
    42
}

const fn default_true() -> bool {
    true
}
