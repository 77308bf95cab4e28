//! Prelude module for common re-exports.
//!
//! ```rust
//! use gpwm_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{
    ConfigError, ConfigLoader, ControlConfig, DeviceConfig, LogLevel, PwmConfig, SharedConfig,
};

// ─── Constants ──────────────────────────────────────────────────────
pub use crate::consts::{
    CMD_DEBUG, CMD_START, CMD_STOP, CONTROL_RAW_STATE, CONTROL_START, CONTROL_STOP, PWM_PIN,
};

// ─── Errors ─────────────────────────────────────────────────────────
pub use crate::error::{PwmError, PwmResult};

// ─── Protocol ───────────────────────────────────────────────────────
pub use crate::protocol::{Request, Response};

// ─── Client ─────────────────────────────────────────────────────────
pub use crate::client::ControlClient;
