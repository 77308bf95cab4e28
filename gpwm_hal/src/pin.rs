//! Pin-level operations on top of the register bank.
//!
//! A `PinController` addresses one GPIO line by bit index. It holds no
//! state of its own; direction, level and function routing all live in the
//! hardware registers.

use crate::register::{RegisterBank, RegisterId, RegisterSnapshot};
use gpwm_common::consts::REGISTER_BITS;
use gpwm_common::error::{PwmError, PwmResult};
use std::fmt;
use tracing::{debug, info, warn};

/// Bit index validated against the register width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinIndex(u8);

impl PinIndex {
    /// Validate `bit`.
    ///
    /// # Errors
    /// Returns `PwmError::InvalidPin` if `bit >= 64`.
    pub fn new(bit: u8) -> PwmResult<Self> {
        if bit >= REGISTER_BITS {
            return Err(PwmError::InvalidPin(bit));
        }
        Ok(Self(bit))
    }

    /// Raw bit position.
    pub fn bit(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for PinIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Electrical level of a pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// Logic 0
    Low,
    /// Logic 1
    High,
}

impl Level {
    /// `true` for `High`.
    pub fn is_high(&self) -> bool {
        matches!(self, Self::High)
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high { Self::High } else { Self::Low }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Low => "LOW",
            Self::High => "HIGH",
        })
    }
}

/// Pin direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Driven by the output-level register
    Output,
    /// Sensed only
    Input,
}

/// Outcome of routing the pin to the GPIO function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MuxStatus {
    /// Select bit reads back clear.
    Gpio,
    /// Select bit still set after the write.
    StillAlternate,
}

/// One GPIO line plus the mux bit that routes it.
pub struct PinController {
    bank: RegisterBank,
    pin: PinIndex,
    mux_bit: PinIndex,
}

impl PinController {
    /// Wrap a fully mapped bank.
    pub fn new(bank: RegisterBank, pin: PinIndex, mux_bit: PinIndex) -> Self {
        Self { bank, pin, mux_bit }
    }

    /// GPIO line driven by this controller.
    pub fn pin(&self) -> PinIndex {
        self.pin
    }

    /// Clear the mux select bit so the line is routed to GPIO.
    ///
    /// The bit is re-read after the write. A mismatch is logged and
    /// returned but not treated as an error: the wiring is outside the
    /// driver's control and the rest of the setup proceeds regardless.
    pub fn configure_function(&self) -> MuxStatus {
        let bit = self.mux_bit.bit();
        info!(
            "GEN_CFG0 before: {:#018x}",
            self.bank.read_bits(RegisterId::MuxCfg)
        );
        self.bank.set_bit(RegisterId::MuxCfg, bit, false);

        let after = self.bank.read_bits(RegisterId::MuxCfg);
        info!("GEN_CFG0 after: {:#018x}", after);

        if (after >> bit) & 1 == 1 {
            warn!("GPIO{} may still be in NAND mode (nand_sel=1)", self.pin);
            MuxStatus::StillAlternate
        } else {
            info!("GPIO{} configured as GPIO function (nand_sel=0)", self.pin);
            MuxStatus::Gpio
        }
    }

    /// Set the pin direction. The hardware uses 0 for output, 1 for input.
    pub fn set_direction(&self, direction: Direction) {
        let input = direction == Direction::Input;
        self.bank.set_bit(RegisterId::DirCfg, self.pin.bit(), input);
        debug!(
            "GPIO{} set as {}",
            self.pin,
            if input { "INPUT" } else { "OUTPUT" }
        );
    }

    /// Drive the output-level bit.
    pub fn write_level(&self, level: Level) {
        self.bank
            .set_bit(RegisterId::OutLevel, self.pin.bit(), level.is_high());
        debug!("GPIO{} set to {}", self.pin, level);
    }

    /// Sensed electrical level from the input register.
    pub fn read_level(&self) -> Level {
        Level::from(self.bank.get_bit(RegisterId::InLevel, self.pin.bit()))
    }

    /// Raw values of all four registers. Never writes.
    pub fn dump(&self) -> RegisterSnapshot {
        self.bank.snapshot()
    }

    /// Give back the bank for unmapping.
    pub fn into_bank(self) -> RegisterBank {
        self.bank
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::simulation::SimulatedBoard;
    use gpwm_common::consts::{NAND_SEL_BIT, PWM_PIN};

    fn controller(board: &SimulatedBoard) -> PinController {
        let bank = RegisterBank::map(board).unwrap();
        PinController::new(
            bank,
            PinIndex::new(PWM_PIN).unwrap(),
            PinIndex::new(NAND_SEL_BIT).unwrap(),
        )
    }

    #[test]
    fn pin_index_rejects_out_of_range() {
        assert!(PinIndex::new(63).is_ok());
        assert!(matches!(PinIndex::new(64), Err(PwmError::InvalidPin(64))));
    }

    #[test]
    fn configure_function_clears_only_select_bit() {
        let board = SimulatedBoard::new();
        let pin = controller(&board);
        let mut cfg = board.peek(RegisterId::MuxCfg);
        cfg |= 0b11;
        pin.bank.write_bits(RegisterId::MuxCfg, cfg);

        assert_eq!(pin.configure_function(), MuxStatus::Gpio);
        assert_eq!(board.peek(RegisterId::MuxCfg), 0b11);
    }

    #[test]
    fn stuck_select_bit_is_reported_not_fatal() {
        let board = SimulatedBoard::new();
        board.stick_mux_bit();
        let pin = controller(&board);

        assert_eq!(pin.configure_function(), MuxStatus::StillAlternate);
        // Setup continues regardless.
        pin.set_direction(Direction::Output);
        pin.write_level(Level::High);
        assert_eq!(pin.read_level(), Level::High);
    }

    #[test]
    fn direction_bit_is_inverted() {
        let board = SimulatedBoard::new();
        let pin = controller(&board);

        pin.set_direction(Direction::Output);
        assert_eq!(board.peek(RegisterId::DirCfg) & (1 << 60), 0);
        pin.set_direction(Direction::Input);
        assert_eq!(board.peek(RegisterId::DirCfg) & (1 << 60), 1 << 60);
    }

    #[test]
    fn read_level_reports_sensed_not_written_value() {
        let board = SimulatedBoard::new();
        let pin = controller(&board);

        // Input pin: the written level is not what is sensed.
        pin.set_direction(Direction::Input);
        pin.write_level(Level::High);
        assert_eq!(pin.read_level(), Level::Low);
        board.drive_input(60, true);
        assert_eq!(pin.read_level(), Level::High);

        pin.set_direction(Direction::Output);
        pin.write_level(Level::Low);
        assert_eq!(pin.read_level(), Level::Low);
    }

    #[test]
    fn dump_does_not_write() {
        let board = SimulatedBoard::new();
        let pin = controller(&board);
        pin.set_direction(Direction::Output);

        let before: Vec<u64> = RegisterId::ALL.iter().map(|id| board.write_count(*id)).collect();
        let snapshot = pin.dump();
        let after: Vec<u64> = RegisterId::ALL.iter().map(|id| board.write_count(*id)).collect();

        assert_eq!(before, after);
        assert_eq!(snapshot.oen, board.peek(RegisterId::DirCfg));
        assert_eq!(snapshot.cfg0, board.peek(RegisterId::MuxCfg));
    }
}
