//! Control socket protocol.
//!
//! One JSON document per line in each direction. A request mirrors the
//! three entry points of a character device (write, read, ioctl) so the
//! daemon's dispatch table stays a 1:1 mapping of the classic interface.

use crate::error::{PwmError, PwmResult};
use serde::{Deserialize, Serialize};

/// A request from a control client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Request {
    /// Write a command payload; only the first byte is interpreted.
    Write(Vec<u8>),
    /// Read the status text into a buffer of `capacity` bytes.
    Read {
        /// Caller buffer size in bytes
        capacity: usize,
    },
    /// Issue a numeric control code.
    Control(u32),
}

/// The daemon's answer to a [`Request`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Response {
    /// Number of payload bytes consumed by a write.
    Written(usize),
    /// Status text returned by a read.
    Status(String),
    /// Return value of a control code.
    Code(i64),
    /// Request failed.
    Error {
        /// errno-style code, see [`PwmError::errno`]
        errno: i32,
        /// Human-readable reason
        message: String,
    },
}

impl Request {
    /// Serialize as a single newline-terminated line.
    pub fn encode_line(&self) -> PwmResult<String> {
        encode(self)
    }

    /// Parse a single line.
    pub fn decode_line(line: &str) -> PwmResult<Self> {
        decode(line)
    }
}

impl Response {
    /// Serialize as a single newline-terminated line.
    pub fn encode_line(&self) -> PwmResult<String> {
        encode(self)
    }

    /// Parse a single line.
    pub fn decode_line(line: &str) -> PwmResult<Self> {
        decode(line)
    }

    /// Build an error response from a failed operation.
    pub fn from_error(err: &PwmError) -> Self {
        Self::Error {
            errno: err.errno(),
            message: err.to_string(),
        }
    }

    /// Turn `Response::Error` back into a `PwmError`.
    pub fn into_result(self) -> PwmResult<Self> {
        match self {
            Self::Error { errno, message } => Err(PwmError::from_errno(errno, message)),
            other => Ok(other),
        }
    }
}

fn encode<T: Serialize>(value: &T) -> PwmResult<String> {
    let mut line =
        serde_json::to_string(value).map_err(|e| PwmError::TransferFault(e.to_string()))?;
    line.push('\n');
    Ok(line)
}

fn decode<T: serde::de::DeserializeOwned>(line: &str) -> PwmResult<T> {
    serde_json::from_str(line.trim_end()).map_err(|e| PwmError::TransferFault(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_line_is_single_line() {
        let line = Request::Write(b"1\n".to_vec()).encode_line().unwrap();
        assert!(line.ends_with('\n'));
        assert_eq!(line.matches('\n').count(), 1);
        assert_eq!(
            Request::decode_line(&line).unwrap(),
            Request::Write(b"1\n".to_vec())
        );
    }

    #[test]
    fn garbage_is_transfer_fault() {
        assert!(matches!(
            Request::decode_line("{not json"),
            Err(PwmError::TransferFault(_))
        ));
        assert!(matches!(
            Response::decode_line(""),
            Err(PwmError::TransferFault(_))
        ));
    }

    #[test]
    fn error_response_round_trips_to_error() {
        let err = PwmError::InvalidRequest("unknown control code 3".into());
        let resp = Response::from_error(&err);
        assert!(matches!(
            resp.into_result(),
            Err(PwmError::InvalidRequest(m)) if m.contains("code 3")
        ));
        assert_eq!(
            Response::Code(1).into_result().unwrap(),
            Response::Code(1)
        );
    }
}
