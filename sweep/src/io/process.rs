//! Running the planner as a child process with bounded captured output.

use std::io::Read;
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, error, instrument, warn};
use wait_timeout::ChildExt;

/// Captured child process output.
#[derive(Debug)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub stdout_truncated: usize,
    pub stderr_truncated: usize,
    pub timed_out: bool,
    /// Whether stdout contained the watched pattern anywhere, including
    /// bytes beyond the capture limit. `false` when nothing was watched.
    pub stdout_match: bool,
}

impl CommandOutput {
    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// Run a command to completion and capture stdout/stderr without risking pipe deadlocks.
///
/// Output is read concurrently while the child runs. `output_limit_bytes` bounds the amount of
/// stdout/stderr stored in memory (bytes beyond this are discarded while still draining the pipe).
/// With `timeout: None` the call blocks until the child exits.
///
/// `watch` is searched for in the whole stdout stream, not only the stored prefix.
#[instrument(skip_all, fields(timeout_secs = timeout.map(|t| t.as_secs()), output_limit_bytes))]
pub fn run_command(
    mut cmd: Command,
    timeout: Option<Duration>,
    output_limit_bytes: usize,
    watch: Option<&str>,
) -> Result<CommandOutput> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    debug!("spawning child process");
    let mut child = match cmd.spawn() {
        Ok(c) => c,
        Err(e) => {
            error!(err = %e, "failed to spawn command");
            return Err(e).context("spawn command");
        }
    };

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("stdout was not piped"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| anyhow!("stderr was not piped"))?;

    let stdout_scan = watch.map(StreamScan::new);
    let stdout_handle =
        thread::spawn(move || read_stream_limited(stdout, output_limit_bytes, stdout_scan));
    let stderr_handle = thread::spawn(move || read_stream_limited(stderr, output_limit_bytes, None));

    let mut timed_out = false;
    let status = match timeout {
        None => child.wait().context("wait for command")?,
        Some(timeout) => match child.wait_timeout(timeout).context("wait for command")? {
            Some(status) => status,
            None => {
                warn!(
                    timeout_secs = timeout.as_secs(),
                    "command timed out, killing"
                );
                timed_out = true;
                child.kill().context("kill command")?;
                child.wait().context("wait command after kill")?
            }
        },
    };

    let stdout = join_output(stdout_handle).context("join stdout")?;
    let stderr = join_output(stderr_handle).context("join stderr")?;
    let (stdout_truncated, stderr_truncated) = (stdout.truncated, stderr.truncated);

    if stdout_truncated > 0 || stderr_truncated > 0 {
        warn!(stdout_truncated, stderr_truncated, "output truncated");
    }

    debug!(exit_code = ?status.code(), timed_out, "command finished");
    Ok(CommandOutput {
        status,
        stdout: stdout.bytes,
        stderr: stderr.bytes,
        stdout_truncated,
        stderr_truncated,
        timed_out,
        stdout_match: stdout.matched,
    })
}

/// Streaming substring search that survives chunk boundaries.
#[derive(Debug)]
struct StreamScan {
    pattern: Vec<u8>,
    /// Last `pattern.len() - 1` bytes seen, prepended to the next chunk.
    carry: Vec<u8>,
    found: bool,
}

impl StreamScan {
    fn new(pattern: &str) -> Self {
        Self {
            pattern: pattern.as_bytes().to_vec(),
            carry: Vec::new(),
            found: pattern.is_empty(),
        }
    }

    fn feed(&mut self, chunk: &[u8]) {
        if self.found {
            return;
        }
        let mut window = std::mem::take(&mut self.carry);
        window.extend_from_slice(chunk);
        if window.windows(self.pattern.len()).any(|w| w == self.pattern.as_slice()) {
            self.found = true;
            return;
        }
        let keep = (self.pattern.len() - 1).min(window.len());
        self.carry = window.split_off(window.len() - keep);
    }
}

#[derive(Debug)]
struct Captured {
    bytes: Vec<u8>,
    truncated: usize,
    matched: bool,
}

fn join_output(handle: thread::JoinHandle<Result<Captured>>) -> Result<Captured> {
    match handle.join() {
        Ok(result) => result,
        Err(_) => Err(anyhow!("output reader thread panicked")),
    }
}

fn read_stream_limited<R: Read>(
    mut reader: R,
    limit: usize,
    mut scan: Option<StreamScan>,
) -> Result<Captured> {
    let mut buf = Vec::new();
    let mut truncated = 0usize;
    let mut chunk = [0u8; 8192];

    loop {
        let n = reader.read(&mut chunk).context("read output")?;
        if n == 0 {
            break;
        }
        if let Some(scan) = scan.as_mut() {
            scan.feed(&chunk[..n]);
        }
        let remaining = limit.saturating_sub(buf.len());
        if remaining > 0 {
            let keep = n.min(remaining);
            buf.extend_from_slice(&chunk[..keep]);
            truncated += n.saturating_sub(keep);
        } else {
            truncated += n;
        }
    }

    Ok(Captured {
        bytes: buf,
        truncated,
        matched: scan.is_some_and(|scan| scan.found),
    })
}
