//! Waveform timing tests.
//!
//! These run the real 250 ms half-period against the simulated board, so
//! they sample with generous margins around the expected edges.

use gpwm_hal::{ControlSurface, PwmCore, SimulatedBoard};
use proptest::prelude::*;
use std::thread;
use std::time::{Duration, Instant};

const HALF: Duration = Duration::from_millis(250);

/// Sample `raw_state` every `every` for `window`.
fn sample(control: &ControlSurface, window: Duration, every: Duration) -> Vec<bool> {
    let start = Instant::now();
    let mut samples = Vec::new();
    while start.elapsed() < window {
        samples.push(control.raw_state());
        thread::sleep(every);
    }
    samples
}

fn transitions(samples: &[bool]) -> usize {
    samples.windows(2).filter(|w| w[0] != w[1]).count()
}

/// Block until the sensed level goes from low to high.
fn wait_for_rising_edge(control: &ControlSurface, timeout: Duration) -> Instant {
    let start = Instant::now();
    let mut previous = control.raw_state();
    while start.elapsed() < timeout {
        let now = control.raw_state();
        if now && !previous {
            return Instant::now();
        }
        previous = now;
        thread::sleep(Duration::from_millis(2));
    }
    panic!("no rising edge within {timeout:?}");
}

#[test]
fn started_waveform_alternates_every_half_period() {
    let board = SimulatedBoard::new();
    let core = PwmCore::on_load(&board).expect("load");
    let control = core.control();

    control.start();
    thread::sleep(Duration::from_millis(600));

    // Sample mid-phase, one half-period apart.
    let edge = wait_for_rising_edge(&control, Duration::from_secs(1));
    let mut levels = Vec::new();
    for k in 0..4u32 {
        let at = edge + HALF / 2 + HALF * k;
        if let Some(wait) = at.checked_duration_since(Instant::now()) {
            thread::sleep(wait);
        }
        levels.push(control.raw_state());
    }
    assert_eq!(levels, vec![true, false, true, false]);
    assert!(control.status().contains("Running"));

    drop(control);
    core.on_unload();
}

#[test]
fn stop_right_after_start_settles_low() {
    let board = SimulatedBoard::new();
    let core = PwmCore::on_load(&board).expect("load");
    let control = core.control();

    control.start();
    thread::sleep(Duration::from_millis(5));
    control.stop();

    // At most one stray high half-period.
    thread::sleep(HALF + Duration::from_millis(100));
    let samples = sample(&control, Duration::from_millis(700), Duration::from_millis(20));
    assert!(samples.iter().all(|high| !high), "pin not settled low: {samples:?}");
    assert!(control.status().contains("Stopped"));

    drop(control);
    core.on_unload();
}

#[test]
fn repeated_start_and_stop_are_idempotent() {
    let board = SimulatedBoard::new();
    let core = PwmCore::on_load(&board).expect("load");
    let control = core.control();

    control.start();
    control.start();
    thread::sleep(Duration::from_millis(200));
    let samples = sample(&control, Duration::from_millis(1200), Duration::from_millis(25));
    assert!(transitions(&samples) >= 3, "not toggling: {samples:?}");

    control.stop();
    control.stop();
    assert!(!control.raw_state());
    thread::sleep(HALF + Duration::from_millis(100));
    let samples = sample(&control, Duration::from_millis(400), Duration::from_millis(25));
    assert!(samples.iter().all(|high| !high));

    drop(control);
    core.on_unload();
}

#[test]
fn heartbeat_counter_advances_only_while_running() {
    let board = SimulatedBoard::new();
    let core = PwmCore::on_load(&board).expect("load");

    thread::sleep(Duration::from_millis(600));
    assert_eq!(core.cycles(), 0);

    core.control().start();
    thread::sleep(Duration::from_millis(1150));
    let cycles = core.cycles();
    assert!((1..=2).contains(&cycles), "cycles = {cycles}");

    core.on_unload();
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(4))]

    #[test]
    fn settled_level_follows_last_command(commands in prop::collection::vec(any::<bool>(), 1..6)) {
        let board = SimulatedBoard::new();
        let core = PwmCore::on_load(&board).expect("load");
        let control = core.control();

        for &start in &commands {
            if start {
                control.start();
            } else {
                control.stop();
            }
            thread::sleep(Duration::from_millis(3));
        }
        let last_start = *commands.last().unwrap();

        thread::sleep(HALF + Duration::from_millis(100));
        let samples = sample(&control, Duration::from_millis(800), Duration::from_millis(20));
        if last_start {
            prop_assert!(transitions(&samples) >= 2, "not toggling: {:?}", samples);
        } else {
            prop_assert!(samples.iter().all(|high| !high), "not low: {:?}", samples);
        }

        drop(control);
        core.on_unload();
    }
}
