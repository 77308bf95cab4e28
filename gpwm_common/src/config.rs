//! Configuration loading traits and types.
//!
//! The daemon reads a single TOML file. Every field has a default so a
//! missing file, a missing section or a section with only some keys set
//! still yields a usable configuration; the fixed
//! hardware addressing and waveform timing live in [`crate::consts`] and
//! are deliberately absent here.
//!
//! # TOML Example
//!
//! ```toml
//! [shared]
//! log_level = "debug"
//! service_name = "gpwm-gpio60"
//!
//! [device]
//! backend = "devmem"
//! mem_path = "/dev/mem"
//!
//! [control]
//! socket_path = "/run/gpwm.sock"
//! io_timeout_ms = 1000
//! ```

use crate::consts::{
    BACKEND_DEVMEM, BUILTIN_BACKENDS, DEFAULT_MEM_PATH, DEFAULT_SOCKET_PATH, SERVICE_NAME,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log level for application logging.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose, detailed tracing information.
    Trace,
    /// Debug information useful during development.
    Debug,
    /// General information about application operation.
    #[default]
    Info,
    /// Warning messages for potentially problematic situations.
    Warn,
    /// Error messages for serious problems.
    Error,
}

impl LogLevel {
    /// Filter directive understood by `tracing_subscriber::EnvFilter`.
    pub fn as_directive(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Common configuration fields shared by the daemon and the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedConfig {
    /// Logging verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Application instance identifier.
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            service_name: SERVICE_NAME.to_string(),
        }
    }
}

impl SharedConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if `service_name` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Register backend selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeviceConfig {
    /// Backend name ("devmem" or "simulation").
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Physical memory device mapped by the "devmem" backend.
    #[serde(default = "default_mem_path")]
    pub mem_path: PathBuf,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            mem_path: default_mem_path(),
        }
    }
}

/// Control socket settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ControlConfig {
    /// Unix socket the daemon listens on.
    #[serde(default = "default_socket_path")]
    pub socket_path: PathBuf,

    /// Per-connection read/write timeout in milliseconds.
    #[serde(default = "default_io_timeout_ms")]
    pub io_timeout_ms: u64,
}

impl ControlConfig {
    /// Timeout as a `Duration`.
    pub fn io_timeout(&self) -> Duration {
        Duration::from_millis(self.io_timeout_ms)
    }
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            socket_path: default_socket_path(),
            io_timeout_ms: default_io_timeout_ms(),
        }
    }
}

/// Full daemon configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PwmConfig {
    /// Logging and instance name.
    #[serde(default)]
    pub shared: SharedConfig,

    /// Register backend.
    #[serde(default)]
    pub device: DeviceConfig,

    /// Control socket.
    #[serde(default)]
    pub control: ControlConfig,
}

impl PwmConfig {
    /// Load from `path`, falling back to defaults when the file is absent.
    ///
    /// Parse and validation errors are still reported.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        let config = match Self::load(path) {
            Ok(config) => config,
            Err(ConfigError::FileNotFound) => Self::default(),
            Err(e) => return Err(e),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate all sections.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        if !BUILTIN_BACKENDS.contains(&self.device.backend.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "device.backend '{}' is not one of {:?}",
                self.device.backend, BUILTIN_BACKENDS
            )));
        }
        if self.device.mem_path.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(
                "device.mem_path cannot be empty".to_string(),
            ));
        }
        if self.control.socket_path.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(
                "control.socket_path cannot be empty".to_string(),
            ));
        }
        if self.control.io_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "control.io_timeout_ms must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_service_name() -> String {
    SERVICE_NAME.to_string()
}

fn default_backend() -> String {
    BACKEND_DEVMEM.to_string()
}

fn default_mem_path() -> PathBuf {
    PathBuf::from(DEFAULT_MEM_PATH)
}

fn default_socket_path() -> PathBuf {
    PathBuf::from(DEFAULT_SOCKET_PATH)
}

fn default_io_timeout_ms() -> u64 {
    1000
}

/// Trait for loading configuration from TOML files.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

// Blanket implementation for all types that implement DeserializeOwned.
impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}
