//! Synchronous control surface.
//!
//! Every operation returns after at most a couple of register accesses; none
//! waits on the waveform task. `toggle` is a read-then-act composition and
//! is not atomic with respect to other callers: two concurrent toggles may
//! both observe "Stopped" and both start, or interleave with a direct
//! start/stop and leave the opposite of what either caller wanted.

use crate::pin::{Level, PinController};
use crate::register::RegisterSnapshot;
use crate::scheduler::WaveformFlag;
use gpwm_common::consts::WAVEFORM_RATE;
use std::sync::Arc;
use tracing::info;

/// Cloneable handle used by request handlers.
#[derive(Clone)]
pub struct ControlSurface {
    pin: Arc<PinController>,
    flag: Arc<WaveformFlag>,
}

impl ControlSurface {
    /// Build a surface over a pin and the waveform flag.
    pub fn new(pin: Arc<PinController>, flag: Arc<WaveformFlag>) -> Self {
        Self { pin, flag }
    }

    /// Enable the waveform. The task does the toggling.
    pub fn start(&self) {
        self.flag.enable();
        info!("GPIO{} PWM started ({} square wave)", self.pin.pin(), WAVEFORM_RATE);
    }

    /// Disable the waveform and force the pin low.
    pub fn stop(&self) {
        self.flag.disable();
        self.pin.write_level(Level::Low);
        info!("GPIO{} PWM stopped", self.pin.pin());
    }

    /// Whether the waveform is enabled.
    pub fn is_running(&self) -> bool {
        self.flag.is_enabled()
    }

    /// Status line, e.g. `GPIO60: PWM Stopped, Current state: LOW\n`.
    pub fn status(&self) -> String {
        let running = if self.is_running() {
            format!("Running ({WAVEFORM_RATE})")
        } else {
            "Stopped".to_string()
        };
        format!(
            "GPIO{}: PWM {}, Current state: {}\n",
            self.pin.pin(),
            running,
            self.pin.read_level()
        )
    }

    /// Sensed pin level.
    pub fn raw_state(&self) -> bool {
        self.pin.read_level().is_high()
    }

    /// Log all four registers and return them.
    pub fn debug_dump(&self) -> RegisterSnapshot {
        let snapshot = self.pin.dump();
        snapshot.log();
        snapshot
    }

    /// Stop if the status says running, start otherwise.
    ///
    /// Returns whether the waveform was started.
    pub fn toggle(&self) -> bool {
        if self.status().contains("Running") {
            self.stop();
            false
        } else {
            self.start();
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::simulation::SimulatedBoard;
    use crate::pin::{Direction, PinIndex};
    use crate::register::{RegisterBank, RegisterId};
    use gpwm_common::consts::{NAND_SEL_BIT, PWM_PIN};

    /// Surface without a waveform task, so levels only change on request.
    fn surface(board: &SimulatedBoard) -> ControlSurface {
        let bank = RegisterBank::map(board).unwrap();
        let pin = PinController::new(
            bank,
            PinIndex::new(PWM_PIN).unwrap(),
            PinIndex::new(NAND_SEL_BIT).unwrap(),
        );
        pin.set_direction(Direction::Output);
        ControlSurface::new(Arc::new(pin), Arc::new(WaveformFlag::new()))
    }

    #[test]
    fn status_text_when_stopped() {
        let board = SimulatedBoard::new();
        let control = surface(&board);
        assert_eq!(control.status(), "GPIO60: PWM Stopped, Current state: LOW\n");
    }

    #[test]
    fn start_writes_nothing() {
        let board = SimulatedBoard::new();
        let control = surface(&board);
        let writes = board.write_count(RegisterId::OutLevel);

        control.start();
        control.start();
        assert!(control.is_running());
        assert_eq!(board.write_count(RegisterId::OutLevel), writes);
        assert!(control.status().starts_with("GPIO60: PWM Running (2Hz)"));
    }

    #[test]
    fn stop_forces_low_and_is_idempotent() {
        let board = SimulatedBoard::new();
        let control = surface(&board);
        control.pin.write_level(Level::High);
        control.start();
        assert!(control.raw_state());

        control.stop();
        let once = (control.is_running(), control.raw_state(), board.peek(RegisterId::OutLevel));
        control.stop();
        let twice = (control.is_running(), control.raw_state(), board.peek(RegisterId::OutLevel));

        assert_eq!(once, (false, false, 0));
        assert_eq!(once, twice);
    }

    #[test]
    fn toggle_alternates() {
        let board = SimulatedBoard::new();
        let control = surface(&board);
        assert!(control.toggle());
        assert!(control.is_running());
        assert!(!control.toggle());
        assert!(!control.is_running());
    }

    #[test]
    fn debug_dump_leaves_registers_untouched() {
        let board = SimulatedBoard::new();
        let control = surface(&board);
        let before: Vec<(u64, u64)> = RegisterId::ALL
            .iter()
            .map(|id| (board.peek(*id), board.write_count(*id)))
            .collect();

        let snapshot = control.debug_dump();

        let after: Vec<(u64, u64)> = RegisterId::ALL
            .iter()
            .map(|id| (board.peek(*id), board.write_count(*id)))
            .collect();
        assert_eq!(before, after);
        assert_eq!(snapshot.out, board.peek(RegisterId::OutLevel));
        assert_eq!(snapshot.input, board.peek(RegisterId::InLevel));
    }
}
