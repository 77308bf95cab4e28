//! Load/unload lifecycle tests against the simulated board.
//!
//! Covers initial state after load, map failures unwinding cleanly,
//! unload ordering and the non-fatal mux verification path.

use gpwm_common::consts::{NAND_SEL_BIT, PWM_PIN};
use gpwm_common::error::PwmError;
use gpwm_hal::register::RegisterId;
use gpwm_hal::{PwmCore, SimulatedBoard};
use std::thread;
use std::time::Duration;

fn pin_mask() -> u64 {
    1u64 << PWM_PIN
}

fn write_counts(board: &SimulatedBoard) -> Vec<u64> {
    RegisterId::ALL.iter().map(|id| board.write_count(*id)).collect()
}

#[test]
fn load_reports_stopped_and_low() {
    let board = SimulatedBoard::new();
    let core = PwmCore::on_load(&board).expect("load");
    let control = core.control();

    let status = control.status();
    assert!(status.contains("Stopped"), "{status}");
    assert!(status.ends_with("LOW\n"), "{status}");
    assert!(!control.raw_state());

    drop(control);
    core.on_unload();
}

#[test]
fn load_configures_mux_direction_and_level() {
    let board = SimulatedBoard::new();
    assert_ne!(board.peek(RegisterId::MuxCfg) & (1 << NAND_SEL_BIT), 0);

    let core = PwmCore::on_load(&board).expect("load");

    assert_eq!(board.peek(RegisterId::MuxCfg) & (1 << NAND_SEL_BIT), 0);
    assert_eq!(board.peek(RegisterId::DirCfg) & pin_mask(), 0, "pin must be an output");
    assert_eq!(board.peek(RegisterId::OutLevel) & pin_mask(), 0);
    // Other pins keep their reset direction.
    assert_eq!(board.peek(RegisterId::DirCfg) | pin_mask(), u64::MAX);

    core.on_unload();
}

#[test]
fn map_failure_aborts_load_without_side_effects() {
    for failing in RegisterId::ALL {
        let board = SimulatedBoard::new();
        board.fail_mapping(failing);

        let result = PwmCore::on_load(&board);
        assert!(
            matches!(result, Err(PwmError::MapFailure { ref register, .. }) if register == failing.name()),
            "failing {failing}"
        );
        assert_eq!(board.mapped_count(), 0, "partial mappings leaked for {failing}");

        // No task was started: nothing ever writes the registers.
        thread::sleep(Duration::from_millis(150));
        assert_eq!(write_counts(&board), vec![0, 0, 0, 0]);
    }
}

#[test]
fn unload_stops_task_forces_low_and_unmaps() {
    let board = SimulatedBoard::new();
    let core = PwmCore::on_load(&board).expect("load");
    core.control().start();
    thread::sleep(Duration::from_millis(120));

    core.on_unload();

    assert_eq!(board.peek(RegisterId::OutLevel) & pin_mask(), 0);
    assert_eq!(board.mapped_count(), 0);

    let counts = write_counts(&board);
    thread::sleep(Duration::from_millis(600));
    assert_eq!(write_counts(&board), counts, "task still writing after unload");
}

#[test]
fn unload_completes_within_one_sleep() {
    let board = SimulatedBoard::new();
    let core = PwmCore::on_load(&board).expect("load");
    core.control().start();
    thread::sleep(Duration::from_millis(50));

    let started = std::time::Instant::now();
    core.on_unload();
    assert!(started.elapsed() < Duration::from_millis(250));
}

#[test]
fn outstanding_control_keeps_registers_mapped() {
    let board = SimulatedBoard::new();
    let core = PwmCore::on_load(&board).expect("load");
    let control = core.control();

    core.on_unload();
    assert_eq!(board.mapped_count(), 4);
    assert!(!control.raw_state());

    drop(control);
    assert_eq!(board.mapped_count(), 0);
}

#[test]
fn dropping_core_releases_everything() {
    let board = SimulatedBoard::new();
    let core = PwmCore::on_load(&board).expect("load");
    core.control().start();
    thread::sleep(Duration::from_millis(50));

    drop(core);
    assert_eq!(board.mapped_count(), 0);
}

#[test]
fn stuck_mux_bit_is_not_fatal() {
    let board = SimulatedBoard::new();
    board.stick_mux_bit();

    let core = PwmCore::on_load(&board).expect("load continues after mux mismatch");

    assert_ne!(board.peek(RegisterId::MuxCfg) & (1 << NAND_SEL_BIT), 0);
    assert_eq!(board.peek(RegisterId::DirCfg) & pin_mask(), 0);
    core.on_unload();
}

#[test]
fn debug_dump_reports_all_registers_unchanged() {
    let board = SimulatedBoard::new();
    let core = PwmCore::on_load(&board).expect("load");
    let control = core.control();
    let counts = write_counts(&board);

    let snapshot = control.debug_dump();

    assert_eq!(write_counts(&board), counts);
    assert_eq!(snapshot.cfg0, board.peek(RegisterId::MuxCfg));
    assert_eq!(snapshot.oen, board.peek(RegisterId::DirCfg));
    assert_eq!(snapshot.out, board.peek(RegisterId::OutLevel));
    assert_eq!(snapshot.input, board.peek(RegisterId::InLevel));

    drop(control);
    core.on_unload();
}
