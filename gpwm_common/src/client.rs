//! Blocking control-socket client.
//!
//! Used by `gpwm_ctl` and by integration tests. Each call sends one request
//! line and waits for one response line.

use crate::consts::STATUS_BUFFER_LEN;
use crate::error::{PwmError, PwmResult};
use crate::protocol::{Request, Response};
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::Path;
use std::time::Duration;

/// Connection to a running daemon.
pub struct ControlClient {
    writer: UnixStream,
    reader: BufReader<UnixStream>,
}

impl ControlClient {
    /// Connect to the daemon socket at `path`.
    pub fn connect(path: &Path, timeout: Duration) -> PwmResult<Self> {
        let stream = UnixStream::connect(path)?;
        stream.set_read_timeout(Some(timeout))?;
        stream.set_write_timeout(Some(timeout))?;
        let reader = BufReader::new(stream.try_clone()?);
        Ok(Self {
            writer: stream,
            reader,
        })
    }

    /// Send a request; error responses become `Err`.
    pub fn request(&mut self, request: &Request) -> PwmResult<Response> {
        self.send_raw(&request.encode_line()?)?.into_result()
    }

    /// Send an already encoded line and decode the reply as-is.
    pub fn send_raw(&mut self, line: &str) -> PwmResult<Response> {
        self.writer.write_all(line.as_bytes())?;
        self.writer.flush()?;

        let mut reply = String::new();
        if self.reader.read_line(&mut reply)? == 0 {
            return Err(PwmError::TransferFault(
                "daemon closed the connection".to_string(),
            ));
        }
        Response::decode_line(&reply)
    }

    /// Write a command payload; returns bytes consumed.
    pub fn write(&mut self, payload: &[u8]) -> PwmResult<usize> {
        match self.request(&Request::Write(payload.to_vec()))? {
            Response::Written(n) => Ok(n),
            other => Err(unexpected(other)),
        }
    }

    /// Read the status text.
    pub fn read_status(&mut self) -> PwmResult<String> {
        match self.request(&Request::Read {
            capacity: STATUS_BUFFER_LEN,
        })? {
            Response::Status(text) => Ok(text),
            other => Err(unexpected(other)),
        }
    }

    /// Issue a control code; returns its value.
    pub fn control(&mut self, code: u32) -> PwmResult<i64> {
        match self.request(&Request::Control(code))? {
            Response::Code(value) => Ok(value),
            other => Err(unexpected(other)),
        }
    }
}

fn unexpected(response: Response) -> PwmError {
    PwmError::TransferFault(format!("unexpected response {response:?}"))
}
