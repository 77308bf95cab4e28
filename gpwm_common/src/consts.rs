//! System-wide constants for the GPIO PWM workspace.
//!
//! Single source of truth for the register map of the Loongson 2K1000
//! GPIO block and for the fixed 2 Hz waveform. None of these are
//! configurable at runtime.

use static_assertions::const_assert;
use std::time::Duration;

/// Canonical daemon service name (used for logging and default config).
pub const SERVICE_NAME: &str = "gpwm_hal";

// ─── Register map ───────────────────────────────────────────────────

/// General configuration register 0 (function mux).
pub const GENERAL_CFG0: u64 = 0x1fe0_0420;

/// GPIO register block base.
pub const GPIO_BASE: u64 = 0x1fe0_0500;

/// Output-enable register offset (0 = output, 1 = input).
pub const GPIO_OEN_OFFSET: u64 = 0x00;

/// Output-level register offset.
pub const GPIO_O_OFFSET: u64 = 0x10;

/// Input-level register offset.
pub const GPIO_I_OFFSET: u64 = 0x20;

/// Width of every register in bits.
pub const REGISTER_BITS: u8 = 64;

/// Width of every register in bytes.
pub const REGISTER_BYTES: usize = 8;

/// `nand_sel` bit in `GENERAL_CFG0` (0 = GPIO, 1 = NAND controller).
pub const NAND_SEL_BIT: u8 = 9;

/// GPIO line driven by the waveform.
pub const PWM_PIN: u8 = 60;

const_assert!(PWM_PIN < REGISTER_BITS);
const_assert!(NAND_SEL_BIT < REGISTER_BITS);
const_assert!(REGISTER_BYTES * 8 == REGISTER_BITS as usize);

// ─── Waveform timing ────────────────────────────────────────────────

/// Duration of one constant-level phase (2 Hz, 50% duty).
pub const HALF_PERIOD: Duration = Duration::from_millis(250);

/// Flag polling interval while the waveform is stopped.
pub const IDLE_POLL: Duration = Duration::from_millis(100);

/// A heartbeat is logged every this many completed cycles.
pub const HEARTBEAT_CYCLES: u64 = 10;

/// Human-readable waveform rate used in status text.
pub const WAVEFORM_RATE: &str = "2Hz";

// ─── Control command bytes and codes ────────────────────────────────

/// Write payload byte: start the waveform.
pub const CMD_START: u8 = b'1';

/// Write payload byte: stop the waveform.
pub const CMD_STOP: u8 = b'0';

/// Write payload byte: dump registers to the log.
pub const CMD_DEBUG: u8 = b'd';

/// Control code: stop.
pub const CONTROL_STOP: u32 = 0;

/// Control code: start.
pub const CONTROL_START: u32 = 1;

/// Control code: return the sensed pin level as 0/1.
pub const CONTROL_RAW_STATE: u32 = 2;

/// Read buffer capacity used by the command-line client.
pub const STATUS_BUFFER_LEN: usize = 99;

// ─── Register backends ──────────────────────────────────────────────

/// Backend mapping the physical registers through the memory device.
pub const BACKEND_DEVMEM: &str = "devmem";

/// In-memory board used for development and tests.
pub const BACKEND_SIMULATION: &str = "simulation";

/// Backends the daemon ships with.
pub const BUILTIN_BACKENDS: [&str; 2] = [BACKEND_DEVMEM, BACKEND_SIMULATION];

// ─── Default paths ──────────────────────────────────────────────────

/// Default daemon configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/gpwm/gpwm.toml";

/// Default control socket.
pub const DEFAULT_SOCKET_PATH: &str = "/run/gpwm.sock";

/// Default physical memory device.
pub const DEFAULT_MEM_PATH: &str = "/dev/mem";
