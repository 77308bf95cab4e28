//! Background waveform task.
//!
//! One thread drives the pin while [`WaveformFlag`] is set: high for a
//! half-period, low for a half-period, then the flag is sampled again.
//! While the flag is clear the thread only polls it. The flag is never
//! read mid-cycle, so a stop takes effect at the next half-period boundary
//! at the latest (the control surface also forces the pin low at once).
//!
//! Shutdown goes through [`StopSignal`], which doubles as the sleep
//! primitive: a pending sleep returns as soon as shutdown is requested.

use crate::pin::{Level, PinController};
use gpwm_common::consts::{HALF_PERIOD, HEARTBEAT_CYCLES, IDLE_POLL};
use gpwm_common::error::{PwmError, PwmResult};
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Waveform enable flag shared by the task and the control surface.
///
/// Written with release, read with acquire. Concurrent writers are
/// last-write-wins.
#[derive(Debug, Default)]
pub struct WaveformFlag(AtomicBool);

impl WaveformFlag {
    /// New flag, disabled.
    pub fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    /// Enable the waveform.
    pub fn enable(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Disable the waveform.
    pub fn disable(&self) {
        self.0.store(false, Ordering::Release);
    }

    /// Current value.
    pub fn is_enabled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// One-shot shutdown request with an interruptible sleep.
#[derive(Debug, Default)]
struct StopSignal {
    stopped: Mutex<bool>,
    cv: Condvar,
}

impl StopSignal {
    fn request(&self) {
        *self.stopped.lock() = true;
        self.cv.notify_all();
    }

    fn is_requested(&self) -> bool {
        *self.stopped.lock()
    }

    /// Sleep for `duration`; returns `true` if shutdown was requested.
    fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        let mut stopped = self.stopped.lock();
        while !*stopped {
            if self.cv.wait_until(&mut stopped, deadline).timed_out() {
                break;
            }
        }
        *stopped
    }
}

/// Handle to the running waveform thread.
///
/// Dropping the handle stops and joins the thread.
pub struct WaveformScheduler {
    stop: Arc<StopSignal>,
    cycles: Arc<AtomicU64>,
    handle: Option<JoinHandle<()>>,
}

impl WaveformScheduler {
    /// Start the waveform thread.
    ///
    /// # Errors
    /// Returns `PwmError::SpawnFailed` if the thread cannot be created.
    pub fn spawn(pin: Arc<PinController>, flag: Arc<WaveformFlag>) -> PwmResult<Self> {
        let stop = Arc::new(StopSignal::default());
        let cycles = Arc::new(AtomicU64::new(0));

        let handle = {
            let stop = Arc::clone(&stop);
            let cycles = Arc::clone(&cycles);
            thread::Builder::new()
                .name("gpwm_waveform".to_string())
                .spawn(move || run_waveform(&pin, &flag, &stop, &cycles))
                .map_err(|e| PwmError::SpawnFailed(e.to_string()))?
        };

        info!("Waveform task started");
        Ok(Self {
            stop,
            cycles,
            handle: Some(handle),
        })
    }

    /// Completed high/low cycles since the task started.
    pub fn cycles(&self) -> u64 {
        self.cycles.load(Ordering::Relaxed)
    }

    /// Stop and join the thread. Later calls do nothing.
    pub fn shutdown(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        self.stop.request();
        if handle.join().is_err() {
            error!("Waveform task panicked");
        }
        info!("Waveform task stopped after {} cycles", self.cycles());
    }
}

impl Drop for WaveformScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_waveform(pin: &PinController, flag: &WaveformFlag, stop: &StopSignal, cycles: &AtomicU64) {
    while !stop.is_requested() {
        if !flag.is_enabled() {
            if stop.sleep(IDLE_POLL) {
                break;
            }
            continue;
        }

        pin.write_level(Level::High);
        if stop.sleep(HALF_PERIOD) {
            break;
        }
        pin.write_level(Level::Low);
        if stop.sleep(HALF_PERIOD) {
            break;
        }

        let count = cycles.fetch_add(1, Ordering::Relaxed) + 1;
        if is_heartbeat(count) {
            debug!("GPIO{} PWM running, cycles: {}", pin.pin(), count);
        }
    }
}

/// Whether completing cycle `count` logs a heartbeat.
fn is_heartbeat(count: u64) -> bool {
    count != 0 && count % HEARTBEAT_CYCLES == 0
}
