//! Engine subprocess handle: spawning, line I/O with deadlines and guaranteed termination.

use std::{
    io::{BufRead, BufReader, BufWriter, Write},
    process::{Child, ChildStdin, Command, Stdio},
    sync::mpsc::{self, Receiver, RecvTimeoutError},
    time::{Duration, Instant},
};

use tracing::{trace, warn};

use crate::error::EngineError;

/// How a process ended when it was released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shutdown {
    /// Exited on its own within the grace period.
    Exited,
    /// Had to be killed.
    Killed,
    /// Was already released earlier.
    AlreadyReleased,
}

/// A running engine subprocess with line-oriented access to its stdin/stdout.
///
/// The process is killed on drop if it was not released before.
#[derive(Debug)]
pub struct ProcessHandle {
    child: Child,
    stdin: Option<BufWriter<ChildStdin>>,
    lines: Receiver<String>,
    label: String,
    released: bool,
}

impl ProcessHandle {
    /// Spawns `program` with piped stdin/stdout.
    ///
    /// stderr is discarded unless `allow_stderr` is set.
    pub fn launch(
        program: &str,
        args: &[String],
        label: &str,
        allow_stderr: bool,
    ) -> Result<ProcessHandle, EngineError> {
        let mut cmd = Command::new(program);
        cmd.args(args).stdin(Stdio::piped()).stdout(Stdio::piped());
        if !allow_stderr {
            cmd.stderr(Stdio::null());
        }
        let mut child = cmd.spawn().map_err(|source| EngineError::ProcessLaunch {
            program: program.to_string(),
            source,
        })?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(EngineError::EngineExited);
        };

        let (tx, rx) = mpsc::channel();
        // ends on its own once the process closes stdout
        std::thread::spawn(move || {
            let mut reader = BufReader::new(stdout);
            let mut buf = Vec::new();
            loop {
                buf.clear();
                match reader.read_until(b'\n', &mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(_) => {}
                }
                // engines are not bound to UTF-8 in `id` or `info string` lines
                let line = String::from_utf8_lossy(&buf)
                    .trim_end_matches(['\r', '\n'])
                    .to_string();
                if tx.send(line).is_err() {
                    break;
                }
            }
        });

        Ok(ProcessHandle {
            child,
            stdin: Some(BufWriter::new(stdin)),
            lines: rx,
            label: label.to_string(),
            released: false,
        })
    }

    /// OS process id.
    pub fn id(&self) -> u32 {
        self.child.id()
    }

    /// Writes one line and flushes it.
    pub fn write_line(&mut self, line: &str) -> Result<(), EngineError> {
        let stdin = self.stdin.as_mut().ok_or(EngineError::EngineExited)?;
        trace!(engine = %self.label, "> {line}");
        stdin
            .write_all(line.as_bytes())
            .and_then(|_| stdin.write_all(b"\n"))
            .and_then(|_| stdin.flush())
            .map_err(|_| EngineError::EngineExited)
    }

    /// Next line written by the process, or `ProtocolTimeout` once `deadline` has passed.
    ///
    /// `expected` only names what the caller is waiting for in the timeout error.
    pub fn read_line_until(
        &mut self,
        deadline: Instant,
        expected: &'static str,
        waited: Duration,
    ) -> Result<String, EngineError> {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match self.lines.recv_timeout(remaining) {
            Ok(line) => {
                trace!(engine = %self.label, "< {line}");
                Ok(line)
            }
            Err(RecvTimeoutError::Timeout) => {
                Err(EngineError::ProtocolTimeout { expected, waited })
            }
            Err(RecvTimeoutError::Disconnected) => Err(EngineError::EngineExited),
        }
    }

    /// Closes stdin and waits up to `grace` for the process to exit, then kills it.
    ///
    /// Never fails: problems are logged and the process is considered gone.
    pub fn release(&mut self, grace: Duration) -> Shutdown {
        if self.released {
            return Shutdown::AlreadyReleased;
        }
        self.released = true;
        drop(self.stdin.take());

        let deadline = Instant::now() + grace;
        loop {
            match self.child.try_wait() {
                Ok(Some(status)) => {
                    trace!(engine = %self.label, ?status, "process exited");
                    return Shutdown::Exited;
                }
                Ok(None) if Instant::now() < deadline => {
                    std::thread::sleep(Duration::from_millis(10).min(grace / 10));
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(engine = %self.label, "could not poll process state: {e}");
                    break;
                }
            }
        }

        warn!(engine = %self.label, "process still running after {grace:?}, killing it");
        if let Err(e) = self.child.kill() {
            warn!(engine = %self.label, "could not kill process: {e}");
        }
        if let Err(e) = self.child.wait() {
            warn!(engine = %self.label, "could not reap process: {e}");
        }
        Shutdown::Killed
    }

    /// True once [`release`](Self::release) ran.
    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl Drop for ProcessHandle {
    fn drop(&mut self) {
        static CLEANUP_DURATION: Duration = Duration::from_millis(100);
        if !self.released {
            self.release(CLEANUP_DURATION);
        }
    }
}
