//! Register backend implementations.
//!
//! - [`devmem`] - Physical registers through `/dev/mem`
//! - [`simulation`] - In-memory board for development and testing
//!
//! # Adding New Backends
//!
//! 1. Create a new submodule under `backends/`
//! 2. Implement `RegisterMapper` from [`crate::register`]
//! 3. Register its factory in [`register_builtin_backends`]

pub mod devmem;
pub mod simulation;

use crate::backend_registry::BackendRegistry;
use gpwm_common::consts::{BACKEND_DEVMEM, BACKEND_SIMULATION};

/// Register all built-in backends.
pub fn register_builtin_backends(registry: &mut BackendRegistry) {
    registry.register(BACKEND_DEVMEM, devmem::create_backend);
    registry.register(BACKEND_SIMULATION, simulation::create_backend);
}
