//! Register bank for the GPIO controller and the function-mux register.
//!
//! The four 64-bit registers are reached through [`RegisterIo`] handles
//! produced by a [`RegisterMapper`] backend. A [`RegisterBank`] only exists
//! when all four handles were obtained; handles obtained before a failing
//! one are dropped (and therefore unmapped) before the error is returned.
//!
//! Read-modify-write helpers are not atomic. The waveform task and the
//! control surface each touch a single bit per write, which is the only
//! discipline the hardware needs here.

use gpwm_common::consts::{
    GENERAL_CFG0, GPIO_BASE, GPIO_I_OFFSET, GPIO_O_OFFSET, GPIO_OEN_OFFSET, REGISTER_BITS,
};
use gpwm_common::error::PwmResult;
use std::fmt;
use tracing::{error, info, warn};

/// Identifies one of the four registers of the bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegisterId {
    /// General configuration register 0 (function mux).
    MuxCfg,
    /// Output-enable register (0 = output, 1 = input).
    DirCfg,
    /// Output-level register.
    OutLevel,
    /// Input-level register.
    InLevel,
}

impl RegisterId {
    /// All registers, in mapping order.
    pub const ALL: [RegisterId; 4] = [
        RegisterId::MuxCfg,
        RegisterId::DirCfg,
        RegisterId::OutLevel,
        RegisterId::InLevel,
    ];

    /// Name used in register dumps and errors.
    pub fn name(&self) -> &'static str {
        match self {
            Self::MuxCfg => "GEN_CFG0",
            Self::DirCfg => "GPIO_OEN",
            Self::OutLevel => "GPIO_OUT",
            Self::InLevel => "GPIO_IN",
        }
    }

    /// Physical address of the register.
    pub fn phys_addr(&self) -> u64 {
        match self {
            Self::MuxCfg => GENERAL_CFG0,
            Self::DirCfg => GPIO_BASE + GPIO_OEN_OFFSET,
            Self::OutLevel => GPIO_BASE + GPIO_O_OFFSET,
            Self::InLevel => GPIO_BASE + GPIO_I_OFFSET,
        }
    }
}

impl fmt::Display for RegisterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Whole-register access to one mapped 64-bit register.
///
/// Implementations validate bounds and alignment when the handle is
/// created; dropping the handle releases the mapping.
pub trait RegisterIo: Send + Sync {
    /// Read the register as a single 64-bit access.
    fn read(&self) -> u64;

    /// Write the register as a single 64-bit access.
    fn write(&self, value: u64);
}

/// Backend able to map physical registers into the process.
pub trait RegisterMapper: Send + Sync {
    /// Backend identifier (e.g., "devmem", "simulation").
    fn name(&self) -> &'static str;

    /// Map the 8-byte register at `phys_addr`.
    ///
    /// # Errors
    /// Returns `PwmError::MapFailure` if the range cannot be mapped.
    fn map(&self, id: RegisterId, phys_addr: u64) -> PwmResult<Box<dyn RegisterIo>>;
}

/// Raw values of all four registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterSnapshot {
    /// Output-enable register
    pub oen: u64,
    /// Output-level register
    pub out: u64,
    /// Input-level register
    pub input: u64,
    /// General configuration register 0
    pub cfg0: u64,
}

impl RegisterSnapshot {
    /// Emit the snapshot on the diagnostic channel.
    pub fn log(&self) {
        info!("=== Register Dump ===");
        info!("GPIO_OEN: {:#018x}", self.oen);
        info!("GPIO_OUT: {:#018x}", self.out);
        info!("GPIO_IN:  {:#018x}", self.input);
        info!("GEN_CFG0: {:#018x}", self.cfg0);
        info!("=====================");
    }
}

/// The four mapped registers.
pub struct RegisterBank {
    mux_cfg: Box<dyn RegisterIo>,
    dir_cfg: Box<dyn RegisterIo>,
    out_level: Box<dyn RegisterIo>,
    in_level: Box<dyn RegisterIo>,
}

impl RegisterBank {
    /// Map all four registers through `mapper`.
    ///
    /// # Errors
    /// Returns the first `PwmError::MapFailure`; registers mapped before it
    /// are released before returning.
    pub fn map(mapper: &dyn RegisterMapper) -> PwmResult<Self> {
        let mux_cfg = map_register(mapper, RegisterId::MuxCfg, 0)?;
        let dir_cfg = map_register(mapper, RegisterId::DirCfg, 1)?;
        let out_level = map_register(mapper, RegisterId::OutLevel, 2)?;
        let in_level = map_register(mapper, RegisterId::InLevel, 3)?;

        info!("All registers mapped successfully ({})", mapper.name());
        Ok(Self {
            mux_cfg,
            dir_cfg,
            out_level,
            in_level,
        })
    }

    /// Release all four mappings.
    pub fn unmap(self) {
        drop(self);
        info!("All registers unmapped");
    }

    fn register(&self, id: RegisterId) -> &dyn RegisterIo {
        match id {
            RegisterId::MuxCfg => self.mux_cfg.as_ref(),
            RegisterId::DirCfg => self.dir_cfg.as_ref(),
            RegisterId::OutLevel => self.out_level.as_ref(),
            RegisterId::InLevel => self.in_level.as_ref(),
        }
    }

    /// Read a whole register.
    pub fn read_bits(&self, id: RegisterId) -> u64 {
        self.register(id).read()
    }

    /// Write a whole register.
    pub fn write_bits(&self, id: RegisterId, value: u64) {
        self.register(id).write(value);
    }

    /// Test a single bit.
    pub fn get_bit(&self, id: RegisterId, bit: u8) -> bool {
        debug_assert!(bit < REGISTER_BITS, "bit {bit} out of range");
        (self.read_bits(id) >> bit) & 1 == 1
    }

    /// Read-modify-write a single bit.
    pub fn set_bit(&self, id: RegisterId, bit: u8, value: bool) {
        debug_assert!(bit < REGISTER_BITS, "bit {bit} out of range");
        let mask = 1u64 << bit;
        let current = self.read_bits(id);
        let next = if value { current | mask } else { current & !mask };
        self.write_bits(id, next);
    }

    /// Read all four registers.
    pub fn snapshot(&self) -> RegisterSnapshot {
        RegisterSnapshot {
            oen: self.read_bits(RegisterId::DirCfg),
            out: self.read_bits(RegisterId::OutLevel),
            input: self.read_bits(RegisterId::InLevel),
            cfg0: self.read_bits(RegisterId::MuxCfg),
        }
    }
}

fn map_register(
    mapper: &dyn RegisterMapper,
    id: RegisterId,
    held: usize,
) -> PwmResult<Box<dyn RegisterIo>> {
    mapper.map(id, id.phys_addr()).inspect_err(|e| {
        error!("Failed to map {} at {:#x}: {}", id, id.phys_addr(), e);
        if held > 0 {
            warn!("Releasing {} partially mapped register(s)", held);
        }
    })
}
