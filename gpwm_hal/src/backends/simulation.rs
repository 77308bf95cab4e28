//! Simulated register backend.
//!
//! `SimulatedBoard` keeps the four registers in memory and models the one
//! piece of electrical behaviour the driver relies on: the input-level
//! register reflects the output-level bit of every pin whose direction bit
//! is 0 (output), and the externally driven level of every input pin.
//!
//! Fault injection covers mapping failures and a mux bit that refuses to
//! clear. Clones share the same board.

use crate::register::{RegisterId, RegisterIo, RegisterMapper};
use gpwm_common::consts::NAND_SEL_BIT;
use gpwm_common::error::{PwmError, PwmResult};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use tracing::{debug, trace};

/// Shared state behind every handle of one simulated board.
#[derive(Debug)]
struct BoardState {
    regs: [AtomicU64; 4],
    writes: [AtomicU64; 4],
    external_inputs: AtomicU64,
    failing: Mutex<HashSet<RegisterId>>,
    mux_stuck: AtomicBool,
    mapped: AtomicUsize,
}

fn slot(id: RegisterId) -> usize {
    match id {
        RegisterId::MuxCfg => 0,
        RegisterId::DirCfg => 1,
        RegisterId::OutLevel => 2,
        RegisterId::InLevel => 3,
    }
}

impl BoardState {
    fn read(&self, id: RegisterId) -> u64 {
        match id {
            RegisterId::InLevel => {
                let oen = self.regs[slot(RegisterId::DirCfg)].load(Ordering::Acquire);
                let out = self.regs[slot(RegisterId::OutLevel)].load(Ordering::Acquire);
                let ext = self.external_inputs.load(Ordering::Acquire);
                (out & !oen) | (ext & oen)
            }
            other => self.regs[slot(other)].load(Ordering::Acquire),
        }
    }

    fn write(&self, id: RegisterId, value: u64) {
        self.writes[slot(id)].fetch_add(1, Ordering::Relaxed);
        let value = match id {
            // Input level is read-only on the real controller.
            RegisterId::InLevel => return,
            RegisterId::MuxCfg if self.mux_stuck.load(Ordering::Relaxed) => {
                value | (1u64 << NAND_SEL_BIT)
            }
            _ => value,
        };
        trace!("sim write {} = {:#018x}", id, value);
        self.regs[slot(id)].store(value, Ordering::Release);
    }
}

/// In-memory stand-in for the GPIO controller.
#[derive(Debug, Clone)]
pub struct SimulatedBoard {
    state: Arc<BoardState>,
}

impl SimulatedBoard {
    /// Board at power-on values: pin function routed to NAND, every pin an input.
    pub fn new() -> Self {
        Self {
            state: Arc::new(BoardState {
                regs: [
                    AtomicU64::new(1u64 << NAND_SEL_BIT),
                    AtomicU64::new(u64::MAX),
                    AtomicU64::new(0),
                    AtomicU64::new(0),
                ],
                writes: Default::default(),
                external_inputs: AtomicU64::new(0),
                failing: Mutex::new(HashSet::new()),
                mux_stuck: AtomicBool::new(false),
                mapped: AtomicUsize::new(0),
            }),
        }
    }

    /// Make every future `map` of `id` fail.
    pub fn fail_mapping(&self, id: RegisterId) {
        self.state.failing.lock().insert(id);
    }

    /// Keep the NAND select bit set regardless of writes.
    pub fn stick_mux_bit(&self) {
        self.state.mux_stuck.store(true, Ordering::Relaxed);
        self.state.regs[slot(RegisterId::MuxCfg)]
            .fetch_or(1u64 << NAND_SEL_BIT, Ordering::AcqRel);
    }

    /// Drive the electrical level seen on an input pin.
    pub fn drive_input(&self, bit: u8, high: bool) {
        let mask = 1u64 << bit;
        if high {
            self.state.external_inputs.fetch_or(mask, Ordering::AcqRel);
        } else {
            self.state.external_inputs.fetch_and(!mask, Ordering::AcqRel);
        }
    }

    /// Number of writes issued to `id` so far.
    pub fn write_count(&self, id: RegisterId) -> u64 {
        self.state.writes[slot(id)].load(Ordering::Relaxed)
    }

    /// Current register value, without going through a mapping.
    pub fn peek(&self, id: RegisterId) -> u64 {
        self.state.read(id)
    }

    /// Number of live register handles.
    pub fn mapped_count(&self) -> usize {
        self.state.mapped.load(Ordering::Acquire)
    }
}

impl Default for SimulatedBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterMapper for SimulatedBoard {
    fn name(&self) -> &'static str {
        "simulation"
    }

    fn map(&self, id: RegisterId, phys_addr: u64) -> PwmResult<Box<dyn RegisterIo>> {
        if self.state.failing.lock().contains(&id) {
            return Err(PwmError::MapFailure {
                register: id.name().to_string(),
                reason: format!("simulated mapping failure at {phys_addr:#x}"),
            });
        }
        self.state.mapped.fetch_add(1, Ordering::AcqRel);
        debug!("sim mapped {} at {:#x}", id, phys_addr);
        Ok(Box::new(SimRegister {
            id,
            state: Arc::clone(&self.state),
        }))
    }
}

/// Handle to one simulated register.
struct SimRegister {
    id: RegisterId,
    state: Arc<BoardState>,
}

impl RegisterIo for SimRegister {
    fn read(&self) -> u64 {
        self.state.read(self.id)
    }

    fn write(&self, value: u64) {
        self.state.write(self.id, value);
    }
}

impl Drop for SimRegister {
    fn drop(&mut self) {
        self.state.mapped.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Factory function to create a simulation backend instance.
pub fn create_backend(_config: &gpwm_common::config::DeviceConfig) -> Box<dyn RegisterMapper> {
    Box::new(SimulatedBoard::new())
}
