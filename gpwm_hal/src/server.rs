//! Unix-socket control server.
//!
//! Each connection carries newline-delimited JSON requests and receives one
//! response line per request. A line that does not decode is answered with
//! a `TransferFault` error and the connection stays open. A line longer
//! than [`MAX_FRAME_LEN`] is answered with `TransferFault` and the
//! connection is closed without buffering the rest. Connections are served
//! on their own threads so a slow client never holds up another.

use crate::control::ControlSurface;
use crate::dispatch::handle;
use gpwm_common::error::{PwmError, PwmResult};
use gpwm_common::protocol::{Request, Response};
use std::io::{BufRead, BufReader, ErrorKind, Read, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// How often the accept loop re-checks the running flag.
const ACCEPT_POLL: Duration = Duration::from_millis(50);

/// Longest request line accepted, newline included.
pub const MAX_FRAME_LEN: usize = 256;

/// Listening control socket.
pub struct ControlServer {
    path: PathBuf,
    running: Arc<AtomicBool>,
    accept: Option<JoinHandle<()>>,
}

impl ControlServer {
    /// Bind `path` and start accepting.
    ///
    /// A stale socket file left by a previous run is removed first.
    pub fn bind(path: &Path, control: ControlSurface, io_timeout: Duration) -> PwmResult<Self> {
        if path.exists() {
            warn!("Removing stale control socket {}", path.display());
            std::fs::remove_file(path)?;
        }
        let listener = UnixListener::bind(path)?;
        listener.set_nonblocking(true)?;
        info!("Control socket listening on {}", path.display());

        let running = Arc::new(AtomicBool::new(true));
        let accept = {
            let running = Arc::clone(&running);
            thread::Builder::new()
                .name("gpwm_accept".to_string())
                .spawn(move || accept_loop(listener, control, running, io_timeout))
                .map_err(|e| PwmError::SpawnFailed(e.to_string()))?
        };

        Ok(Self {
            path: path.to_path_buf(),
            running,
            accept: Some(accept),
        })
    }

    /// Stop accepting, wait for open connections, remove the socket file.
    pub fn shutdown(&mut self) {
        let Some(accept) = self.accept.take() else {
            return;
        };
        self.running.store(false, Ordering::SeqCst);
        if accept.join().is_err() {
            error!("Control accept loop panicked");
        }
        if let Err(e) = std::fs::remove_file(&self.path) {
            debug!("Control socket already removed: {}", e);
        }
        info!("Control socket closed");
    }
}

impl Drop for ControlServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn accept_loop(
    listener: UnixListener,
    control: ControlSurface,
    running: Arc<AtomicBool>,
    io_timeout: Duration,
) {
    let mut connections: Vec<JoinHandle<()>> = Vec::new();

    while running.load(Ordering::SeqCst) {
        match listener.accept() {
            Ok((stream, _)) => {
                let control = control.clone();
                let running = Arc::clone(&running);
                let spawned = thread::Builder::new()
                    .name("gpwm_conn".to_string())
                    .spawn(move || {
                        if let Err(e) = serve_connection(stream, &control, &running, io_timeout) {
                            debug!("Connection closed: {}", e);
                        }
                    });
                match spawned {
                    Ok(handle) => connections.push(handle),
                    Err(e) => warn!("Failed to spawn connection thread: {}", e),
                }
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => thread::sleep(ACCEPT_POLL),
            Err(e) => {
                warn!("Accept failed: {}", e);
                thread::sleep(ACCEPT_POLL);
            }
        }
        connections.retain(|handle| !handle.is_finished());
    }

    for handle in connections {
        let _ = handle.join();
    }
}

fn serve_connection(
    stream: UnixStream,
    control: &ControlSurface,
    running: &AtomicBool,
    io_timeout: Duration,
) -> std::io::Result<()> {
    // Accepted sockets inherit non-blocking mode on some platforms.
    stream.set_nonblocking(false)?;
    // Reads wake up at the accept poll rate so shutdown never waits on an
    // idle client; `io_timeout` is enforced below.
    stream.set_read_timeout(Some(io_timeout.min(ACCEPT_POLL)))?;
    stream.set_write_timeout(Some(io_timeout))?;
    debug!("Control client connected");

    let mut writer = stream.try_clone()?;
    let mut reader = BufReader::new(stream);
    let mut frame = Vec::with_capacity(MAX_FRAME_LEN);
    let mut idle_since = Instant::now();

    while running.load(Ordering::SeqCst) {
        // Partial frames survive a timeout and are completed on the next pass.
        let remaining = (MAX_FRAME_LEN - frame.len()) as u64;
        match reader.by_ref().take(remaining).read_until(b'\n', &mut frame) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                if idle_since.elapsed() >= io_timeout {
                    debug!("Control client idle for {:?}", io_timeout);
                    break;
                }
                continue;
            }
            Err(e) => return Err(e),
        }

        if frame.len() >= MAX_FRAME_LEN && !frame.ends_with(b"\n") {
            let err = PwmError::TransferFault(format!(
                "request line exceeds {MAX_FRAME_LEN} bytes"
            ));
            warn!("Rejected control frame: {}", err);
            send(&mut writer, &Response::from_error(&err))?;
            break;
        }

        let response = match decode_frame(&frame) {
            Ok(request) => handle(control, &request),
            Err(e) => {
                warn!("Rejected control frame: {}", e);
                Response::from_error(&e)
            }
        };
        send(&mut writer, &response)?;
        frame.clear();
        idle_since = Instant::now();
    }

    debug!("Control client disconnected");
    Ok(())
}

fn decode_frame(frame: &[u8]) -> PwmResult<Request> {
    let line = std::str::from_utf8(frame)
        .map_err(|e| PwmError::TransferFault(format!("request is not UTF-8: {e}")))?;
    Request::decode_line(line)
}

fn send(writer: &mut UnixStream, response: &Response) -> std::io::Result<()> {
    let encoded = response
        .encode_line()
        .map_err(|e| std::io::Error::new(ErrorKind::InvalidData, e.to_string()))?;
    writer.write_all(encoded.as_bytes())?;
    writer.flush()
}
