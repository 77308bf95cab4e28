//! Load/unload lifecycle.
//!
//! `PwmCore` owns the resources in acquisition order: register bank (inside
//! the shared pin controller), then the waveform task. Fields are declared
//! so that the task is dropped first, which keeps it from ever touching an
//! unmapped register even when the core is dropped without `on_unload`.

use crate::control::ControlSurface;
use crate::pin::{Direction, Level, MuxStatus, PinController, PinIndex};
use crate::register::{RegisterBank, RegisterMapper};
use crate::scheduler::{WaveformFlag, WaveformScheduler};
use gpwm_common::consts::{NAND_SEL_BIT, PWM_PIN};
use gpwm_common::error::PwmResult;
use std::sync::Arc;
use tracing::{info, warn};

/// The loaded driver: mapped registers, configured pin, running task.
pub struct PwmCore {
    /// Waveform task (dropped first)
    scheduler: WaveformScheduler,
    /// Enable flag shared with the task and the control surface
    flag: Arc<WaveformFlag>,
    /// Pin controller shared with the task and the control surface
    pin: Arc<PinController>,
}

impl PwmCore {
    /// Map, configure and start.
    ///
    /// Steps: map all registers, route the pin to GPIO, make it an output
    /// driven low, start the waveform task (disabled), dump registers. On
    /// failure everything acquired so far is released before returning.
    ///
    /// # Errors
    /// - `MapFailure` if any register cannot be mapped (no task is started)
    /// - `SpawnFailed` if the waveform thread cannot be created
    pub fn on_load(mapper: &dyn RegisterMapper) -> PwmResult<Self> {
        info!("=== Initializing GPIO{} PWM driver ===", PWM_PIN);

        let pin = PinIndex::new(PWM_PIN)?;
        let mux_bit = PinIndex::new(NAND_SEL_BIT)?;
        let bank = RegisterBank::map(mapper)?;
        let pin = Arc::new(PinController::new(bank, pin, mux_bit));

        if pin.configure_function() == MuxStatus::StillAlternate {
            warn!("Continuing pin setup with unverified function routing");
        }

        pin.set_direction(Direction::Output);
        pin.write_level(Level::Low);
        info!("GPIO{} configured as output, initial state: LOW", PWM_PIN);

        let flag = Arc::new(WaveformFlag::new());
        let scheduler = WaveformScheduler::spawn(Arc::clone(&pin), Arc::clone(&flag))?;

        pin.dump().log();
        info!("=== GPIO{} PWM driver loaded successfully ===", PWM_PIN);

        Ok(Self {
            scheduler,
            flag,
            pin,
        })
    }

    /// Handle for request processing.
    pub fn control(&self) -> ControlSurface {
        ControlSurface::new(Arc::clone(&self.pin), Arc::clone(&self.flag))
    }

    /// Completed waveform cycles.
    pub fn cycles(&self) -> u64 {
        self.scheduler.cycles()
    }

    /// Stop the task, force the pin low, unmap the registers.
    ///
    /// Control surfaces still held elsewhere keep the registers mapped until
    /// they are dropped.
    pub fn on_unload(self) {
        info!("=== Unloading GPIO{} PWM driver ===", PWM_PIN);
        let PwmCore {
            mut scheduler,
            flag,
            pin,
        } = self;

        flag.disable();
        scheduler.shutdown();

        pin.write_level(Level::Low);
        info!("GPIO{} set to LOW", PWM_PIN);

        match Arc::try_unwrap(pin) {
            Ok(pin) => pin.into_bank().unmap(),
            Err(_) => warn!("Control surface still referenced; registers unmapped on last release"),
        }
        info!("=== GPIO{} PWM driver unloaded successfully ===", PWM_PIN);
    }
}
