//! `/dev/mem` register backend.
//!
//! Each register is mapped on its own, the same way a kernel driver would
//! `ioremap` four 8-byte windows. `memmap2` takes care of page-aligning the
//! physical offset; the handle checks once that the window is large enough
//! and 8-byte aligned, after which every access is a single volatile
//! 64-bit load or store.

use crate::register::{RegisterId, RegisterIo, RegisterMapper};
use gpwm_common::config::DeviceConfig;
use gpwm_common::consts::REGISTER_BYTES;
use gpwm_common::error::{PwmError, PwmResult};
use memmap2::{MmapOptions, MmapRaw};
use nix::fcntl::OFlag;
use std::fs::OpenOptions;
use std::os::unix::fs::OpenOptionsExt;
use std::path::PathBuf;
use tracing::debug;

/// Maps registers from a physical memory device.
#[derive(Debug, Clone)]
pub struct DevMemMapper {
    path: PathBuf,
}

impl DevMemMapper {
    /// Create a mapper over `path` (usually `/dev/mem`).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RegisterMapper for DevMemMapper {
    fn name(&self) -> &'static str {
        "devmem"
    }

    fn map(&self, id: RegisterId, phys_addr: u64) -> PwmResult<Box<dyn RegisterIo>> {
        // O_SYNC keeps the mapping uncached on Linux.
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(OFlag::O_SYNC.bits())
            .open(&self.path)
            .map_err(|e| map_failure(id, format!("open {}: {}", self.path.display(), e)))?;

        let map = MmapOptions::new()
            .offset(phys_addr)
            .len(REGISTER_BYTES)
            .map_raw(&file)
            .map_err(|e| map_failure(id, format!("mmap {phys_addr:#x}: {e}")))?;

        debug!("Mapped {} at {:#x} -> {:p}", id, phys_addr, map.as_ptr());
        Ok(Box::new(MmioRegister::new(id, map)?))
    }
}

/// One mapped hardware register.
struct MmioRegister {
    map: MmapRaw,
}

impl MmioRegister {
    fn new(id: RegisterId, map: MmapRaw) -> PwmResult<Self> {
        if map.len() < REGISTER_BYTES {
            return Err(map_failure(
                id,
                format!("window of {} bytes is too small", map.len()),
            ));
        }
        let addr = map.as_ptr() as usize;
        if addr % std::mem::align_of::<u64>() != 0 {
            return Err(map_failure(id, format!("address {addr:#x} not 8-byte aligned")));
        }
        Ok(Self { map })
    }

    fn ptr(&self) -> *mut u64 {
        self.map.as_mut_ptr().cast::<u64>()
    }
}

impl RegisterIo for MmioRegister {
    fn read(&self) -> u64 {
        // SAFETY: the window is at least 8 bytes, 8-byte aligned (checked in
        // `new`) and stays mapped for the lifetime of `self.map`.
        unsafe { std::ptr::read_volatile(self.ptr()) }
    }

    fn write(&self, value: u64) {
        // SAFETY: see `read`.
        unsafe { std::ptr::write_volatile(self.ptr(), value) }
    }
}

fn map_failure(id: RegisterId, reason: String) -> PwmError {
    PwmError::MapFailure {
        register: id.name().to_string(),
        reason,
    }
}

/// Factory function to create a `/dev/mem` backend instance.
pub fn create_backend(config: &DeviceConfig) -> Box<dyn RegisterMapper> {
    Box::new(DevMemMapper::new(config.mem_path.clone()))
}
