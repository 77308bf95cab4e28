//! # GPIO PWM HAL Library
//!
//! Drives one GPIO line of the Loongson 2K1000 as a 2 Hz, 50% duty square
//! wave generated in software, and exposes start/stop/status control.
//!
//! # Module Structure
//!
//! - [`register`] - RegisterBank, register handles and backends trait
//! - [`backends`] - `/dev/mem` and simulated register backends
//! - [`backend_registry`] - Backend factory registration
//! - [`pin`] - PinController (mux, direction, level, dump)
//! - [`scheduler`] - WaveformScheduler background task and enable flag
//! - [`control`] - ControlSurface request handlers
//! - [`dispatch`] - write/read/control-code mapping onto the surface
//! - [`core`] - PwmCore load/unload lifecycle
//! - [`server`] - Unix-socket control server
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                         gpwm_hal                               │
//! │  ┌──────────────┐   ┌──────────────┐   ┌───────────────────┐   │
//! │  │ ControlServer│──►│  dispatch    │──►│  ControlSurface   │   │
//! │  └──────────────┘   └──────────────┘   └────┬─────────┬────┘   │
//! │                                             │ flag    │        │
//! │                     ┌───────────────────┐   │         │        │
//! │                     │ WaveformScheduler │◄──┘         │        │
//! │                     └─────────┬─────────┘             │        │
//! │                               ▼                       ▼        │
//! │                        ┌────────────────────────────────┐      │
//! │                        │ PinController ─► RegisterBank  │      │
//! │                        └───────────────┬────────────────┘      │
//! │                                        ▼                       │
//! │                             RegisterMapper (trait object)      │
//! └────────────────────────────────────────────────────────────────┘
//! ```

#![deny(warnings)]
#![deny(missing_docs)]

pub mod backend_registry;
pub mod backends;
pub mod control;
pub mod core;
pub mod dispatch;
pub mod pin;
pub mod register;
pub mod scheduler;
pub mod server;

// Re-export key types for convenience
pub use crate::backend_registry::BackendRegistry;
pub use crate::backends::simulation::SimulatedBoard;
pub use crate::control::ControlSurface;
pub use crate::core::PwmCore;
pub use crate::server::ControlServer;
