//! GPIO PWM Common Library
//!
//! Shared constants, configuration loading, error types and the control
//! socket protocol used by the `gpwm_hal` daemon and the `gpwm_ctl` client.
//!
//! # Module Structure
//!
//! - [`client`] - Blocking control socket client
//! - [`consts`] - Fixed hardware addressing and waveform timing
//! - [`config`] - Configuration loading traits and types
//! - [`error`] - Error type shared by the daemon and the client
//! - [`protocol`] - Control socket request/response framing
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use gpwm_common::prelude::*;
//!
//! let request = Request::Control(CONTROL_RAW_STATE);
//! assert!(request.encode_line().is_ok());
//! ```

pub mod client;
pub mod config;
pub mod consts;
pub mod error;
pub mod prelude;
pub mod protocol;
