//! Error types for GPIO PWM operations.
//!
//! `PwmError` is returned by every fallible operation in the daemon and is
//! carried over the control socket as an errno-style code so the client can
//! report it the same way a device file would.

use crate::config::ConfigError;
use thiserror::Error;

/// Errors that can occur while loading, driving or controlling the pin.
#[derive(Debug, Error)]
pub enum PwmError {
    /// A hardware register range could not be mapped
    #[error("Failed to map register {register}: {reason}")]
    MapFailure {
        /// Register that failed to map
        register: String,
        /// Underlying cause
        reason: String,
    },

    /// Unrecognised control code or malformed write payload
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Payload or response could not cross the control boundary
    #[error("Transfer fault: {0}")]
    TransferFault(String),

    /// Bit index outside the register width
    #[error("Invalid pin index {0} (register width is 64 bits)")]
    InvalidPin(u8),

    /// Background waveform task could not be started
    #[error("Failed to spawn waveform task: {0}")]
    SpawnFailed(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Register backend not registered
    #[error("Register backend not found: {0}")]
    BackendNotFound(String),

    /// IO error
    #[error("IO error: {source}")]
    Io {
        /// Source IO error
        #[from]
        source: std::io::Error,
    },
}

impl PwmError {
    /// Errno a device layer would hand back for this error.
    pub fn errno(&self) -> i32 {
        match self {
            Self::MapFailure { .. } => libc::ENOMEM,
            Self::InvalidRequest(_) | Self::InvalidPin(_) | Self::ConfigError(_) => libc::EINVAL,
            Self::TransferFault(_) => libc::EFAULT,
            Self::SpawnFailed(_) => libc::EAGAIN,
            Self::BackendNotFound(_) => libc::ENODEV,
            Self::Io { source } => source.raw_os_error().unwrap_or(libc::EIO),
        }
    }

    /// Rebuild an error from an errno received over the control socket.
    pub fn from_errno(errno: i32, message: String) -> Self {
        match errno {
            libc::EINVAL => Self::InvalidRequest(message),
            libc::EFAULT => Self::TransferFault(message),
            libc::ENOMEM => Self::MapFailure {
                register: "unknown".to_string(),
                reason: message,
            },
            other => Self::Io {
                source: std::io::Error::from_raw_os_error(other),
            },
        }
    }
}

impl From<ConfigError> for PwmError {
    fn from(err: ConfigError) -> Self {
        Self::ConfigError(err.to_string())
    }
}

/// Result type for GPIO PWM operations
pub type PwmResult<T> = Result<T, PwmError>;
