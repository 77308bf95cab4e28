//! Control protocol framing tests.
//!
//! The server reads one request per line, so every encoded frame must be
//! exactly one line no matter what bytes or text it carries.

use gpwm_common::config::{ConfigLoader, LogLevel, PwmConfig};
use gpwm_common::protocol::{Request, Response};
use proptest::prelude::*;
use std::fs;
use tempfile::TempDir;

proptest! {
    #[test]
    fn write_payload_frames_are_single_lines(payload in prop::collection::vec(any::<u8>(), 0..64)) {
        let line = Request::Write(payload.clone()).encode_line().unwrap();
        prop_assert_eq!(line.matches('\n').count(), 1);
        prop_assert_eq!(Request::decode_line(&line).unwrap(), Request::Write(payload));
    }

    #[test]
    fn status_frames_are_single_lines(text in "\\PC*\n?") {
        let line = Response::Status(text.clone()).encode_line().unwrap();
        prop_assert_eq!(line.matches('\n').count(), 1);
        prop_assert_eq!(Response::decode_line(&line).unwrap(), Response::Status(text));
    }
}

#[test]
fn full_config_file_loads() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("gpwm.toml");
    fs::write(
        &path,
        r#"
[shared]
log_level = "debug"
service_name = "gpwm-gpio60"

[device]
backend = "simulation"
mem_path = "/dev/mem"

[control]
socket_path = "/tmp/gpwm-test.sock"
io_timeout_ms = 250
"#,
    )
    .unwrap();

    let config = PwmConfig::load(&path).unwrap();
    config.validate().unwrap();
    assert_eq!(config.shared.log_level, LogLevel::Debug);
    assert_eq!(config.shared.service_name, "gpwm-gpio60");
    assert_eq!(config.device.backend, "simulation");
    assert_eq!(config.control.io_timeout_ms, 250);
}
