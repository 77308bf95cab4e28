//! Maps control requests onto control-surface operations.
//!
//! | Request | Operation |
//! |---------|-----------|
//! | write `'1'` | start |
//! | write `'0'` | stop |
//! | write `'d'` | debug dump |
//! | read | status |
//! | control 0 / 1 / 2 | stop / start / raw state |
//!
//! Anything else fails with `InvalidRequest` before touching any state.

use crate::control::ControlSurface;
use gpwm_common::consts::{
    CMD_DEBUG, CMD_START, CMD_STOP, CONTROL_RAW_STATE, CONTROL_START, CONTROL_STOP,
};
use gpwm_common::error::{PwmError, PwmResult};
use gpwm_common::protocol::{Request, Response};
use tracing::debug;

/// Execute one request.
///
/// # Errors
/// - `InvalidRequest` for an empty payload, an unknown command byte or an
///   unknown control code
/// - `TransferFault` when the status text does not fit the caller's buffer
pub fn dispatch(control: &ControlSurface, request: &Request) -> PwmResult<Response> {
    debug!("Dispatching {:?}", request);
    match request {
        Request::Write(payload) => {
            let Some(&cmd) = payload.first() else {
                return Err(PwmError::InvalidRequest("empty write payload".to_string()));
            };
            match cmd {
                CMD_START => control.start(),
                CMD_STOP => control.stop(),
                CMD_DEBUG => {
                    control.debug_dump();
                }
                other => {
                    return Err(PwmError::InvalidRequest(format!(
                        "unknown command byte {:#04x}",
                        other
                    )));
                }
            }
            Ok(Response::Written(payload.len()))
        }
        Request::Read { capacity } => {
            let status = control.status();
            if status.len() > *capacity {
                return Err(PwmError::TransferFault(format!(
                    "status needs {} bytes, buffer holds {}",
                    status.len(),
                    capacity
                )));
            }
            Ok(Response::Status(status))
        }
        Request::Control(code) => match *code {
            CONTROL_STOP => {
                control.stop();
                Ok(Response::Code(0))
            }
            CONTROL_START => {
                control.start();
                Ok(Response::Code(0))
            }
            CONTROL_RAW_STATE => Ok(Response::Code(i64::from(control.raw_state()))),
            other => Err(PwmError::InvalidRequest(format!(
                "unknown control code {other}"
            ))),
        },
    }
}

/// Execute one request, folding failures into `Response::Error`.
pub fn handle(control: &ControlSurface, request: &Request) -> Response {
    dispatch(control, request).unwrap_or_else(|e| Response::from_error(&e))
}
