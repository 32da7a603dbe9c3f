//! The `run_shell_command` tool.
//!
//! Commands run through `sh -c` with the sandbox root as working directory.
//! On Unix the shell leads its own process group, so a timeout kills every
//! process the command started, not only `sh`.
//!
//! stdout and stderr are drained on their own threads while the child runs so
//! a chatty command cannot deadlock on a full pipe. The readers are never
//! joined unconditionally: once the deadline passes and the group has been
//! killed, output is reported as captured so far and any reader still blocked
//! on a pipe held by an escaped process is abandoned.

use std::io::{ErrorKind, Read};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

#[cfg(unix)]
use std::os::unix::process::CommandExt;

use serde_json::{json, Value};
use tracing::{debug, warn};
use wait_timeout::ChildExt;

use warden_contracts::{
    error::ToolError,
    tool::{Tool, ToolContext, ToolKind},
};

use crate::str_arg;

/// Bytes of stdout/stderr kept per stream. Anything beyond is drained, counted and dropped.
pub const OUTPUT_LIMIT_BYTES: usize = 64 * 1024;

/// How long readers get to reach EOF after the process group has been killed.
const DRAIN_GRACE: Duration = Duration::from_millis(500);

pub struct RunShellCommand {
    timeout: Duration,
}

impl RunShellCommand {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Bytes read from one stream so far.
#[derive(Default)]
struct StreamCapture {
    kept: Vec<u8>,
    dropped: usize,
}

impl StreamCapture {
    fn push(&mut self, chunk: &[u8]) {
        let room = OUTPUT_LIMIT_BYTES.saturating_sub(self.kept.len());
        let keep = chunk.len().min(room);
        self.kept.extend_from_slice(&chunk[..keep]);
        self.dropped += chunk.len() - keep;
    }
}

struct StreamOutput {
    text: String,
    truncated: usize,
}

impl StreamOutput {
    fn snapshot(capture: &Mutex<StreamCapture>) -> Self {
        let capture = capture.lock().unwrap_or_else(PoisonError::into_inner);
        Self {
            text: String::from_utf8_lossy(&capture.kept).into_owned(),
            truncated: capture.dropped,
        }
    }

    /// The captured text, or `placeholder` when empty, plus a truncation notice.
    fn render(&self, label: &str, placeholder: Option<&str>) -> String {
        let text = match placeholder {
            Some(placeholder) if self.text.is_empty() && self.truncated == 0 => placeholder,
            _ => self.text.as_str(),
        };
        if self.truncated > 0 {
            format!("{text}\n[{label} truncated {} bytes]", self.truncated)
        } else {
            text.to_string()
        }
    }
}

struct Captured {
    exit_code: i32,
    stdout: StreamOutput,
    stderr: StreamOutput,
    timed_out: bool,
}

impl Tool for RunShellCommand {
    fn name(&self) -> &str {
        "run_shell_command"
    }

    fn description(&self) -> &str {
        "Executes a shell command and returns its standard output, standard error, and exit code. \
         Use this for tasks like running tests or other command-line operations."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "The shell command to execute. It runs in the working directory."
                }
            },
            "required": ["command"]
        })
    }

    fn kind(&self) -> ToolKind {
        ToolKind::Process
    }

    fn execute(&self, args: &Value, ctx: &ToolContext<'_>) -> Result<String, ToolError> {
        let command = str_arg(args, "command")?;
        let out = run_with_timeout(command, ctx, self.timeout)?;

        if out.timed_out {
            return Ok(format!(
                "Error: Command timed out after {} seconds.\nSTDOUT:\n{}\nSTDERR:\n{}\nExit Code: {}",
                self.timeout.as_secs(),
                out.stdout.render("stdout", Some("No stdout produced.")),
                out.stderr.render("stderr", Some("No stderr produced.")),
                out.exit_code
            ));
        }
        if out.exit_code != 0 {
            return Ok(format!(
                "Error: Command failed with exit code {}.\nSTDOUT:\n{}\nSTDERR:\n{}",
                out.exit_code,
                out.stdout.render("stdout", Some("No stdout produced.")),
                out.stderr.render("stderr", Some("No stderr produced."))
            ));
        }
        Ok(format!(
            "STDOUT:\n{}\nSTDERR:\n{}\nExit Code: 0",
            out.stdout.render("stdout", None),
            out.stderr.render("stderr", None)
        ))
    }
}

fn run_with_timeout(command: &str, ctx: &ToolContext<'_>, timeout: Duration) -> Result<Captured, ToolError> {
    debug!(command = %command, cwd = %ctx.work_dir.display(), "spawning shell command");
    let mut cmd = Command::new("sh");
    cmd.arg("-c")
        .arg(command)
        .current_dir(ctx.work_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    #[cfg(unix)]
    cmd.process_group(0);

    let deadline = Instant::now() + timeout;
    let mut child = cmd.spawn()?;

    let stdout = child.stdout.take().ok_or_else(|| ToolError::failed("stdout was not piped"))?;
    let stderr = child.stderr.take().ok_or_else(|| ToolError::failed("stderr was not piped"))?;
    let stdout_capture = Arc::new(Mutex::new(StreamCapture::default()));
    let stderr_capture = Arc::new(Mutex::new(StreamCapture::default()));
    let (done_tx, done_rx) = mpsc::channel();
    spawn_reader(stdout, stdout_capture.clone(), done_tx.clone());
    spawn_reader(stderr, stderr_capture.clone(), done_tx);

    let mut timed_out = false;
    let status = match child.wait_timeout(timeout)? {
        Some(status) => status,
        None => {
            warn!(command = %command, timeout_secs = timeout.as_secs(), "command timed out, killing process group");
            timed_out = true;
            kill_process_group(&mut child);
            child.wait()?
        }
    };

    let drain_until = if timed_out { Instant::now() + DRAIN_GRACE } else { deadline };
    let mut open = await_readers(&done_rx, 2, drain_until);
    if open > 0 && !timed_out {
        // The shell exited but processes it left behind still hold its pipes.
        warn!(command = %command, timeout_secs = timeout.as_secs(), "background processes outlived the deadline, killing process group");
        timed_out = true;
        kill_process_group(&mut child);
        open = await_readers(&done_rx, open, Instant::now() + DRAIN_GRACE);
    }
    if open > 0 {
        warn!(open_streams = open, "output pipes still held after kill, abandoning readers");
    }

    let stdout = StreamOutput::snapshot(&stdout_capture);
    let stderr = StreamOutput::snapshot(&stderr_capture);
    if stdout.truncated > 0 || stderr.truncated > 0 {
        warn!(stdout_truncated = stdout.truncated, stderr_truncated = stderr.truncated, "output truncated");
    }

    // A signal-terminated child has no exit code.
    let exit_code = status.code().unwrap_or(1);
    debug!(exit_code, timed_out, "shell command finished");
    Ok(Captured { exit_code, stdout, stderr, timed_out })
}

fn spawn_reader(mut stream: impl Read + Send + 'static, capture: Arc<Mutex<StreamCapture>>, done: Sender<()>) {
    thread::spawn(move || {
        let mut chunk = [0u8; 8192];
        loop {
            match stream.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => capture.lock().unwrap_or_else(PoisonError::into_inner).push(&chunk[..n]),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    debug!(error = %e, "output stream read failed");
                    break;
                }
            }
        }
        let _ = done.send(());
    });
}

/// Wait until `open` readers report EOF or `until` passes. Returns how many are still open.
fn await_readers(done: &Receiver<()>, mut open: usize, until: Instant) -> usize {
    while open > 0 {
        let remaining = until.saturating_duration_since(Instant::now());
        match done.recv_timeout(remaining) {
            Ok(()) => open -= 1,
            Err(_) => break,
        }
    }
    open
}

/// SIGKILL the shell's whole process group.
#[cfg(unix)]
fn kill_process_group(child: &mut Child) {
    use nix::errno::Errno;
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let Ok(pgid) = i32::try_from(child.id()) else {
        let _ = child.kill();
        return;
    };
    match killpg(Pid::from_raw(pgid), Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(e) => {
            warn!(error = %e, pgid, "killpg failed, killing shell only");
            let _ = child.kill();
        }
    }
}

#[cfg(not(unix))]
fn kill_process_group(child: &mut Child) {
    let _ = child.kill();
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use serde_json::json;

    use warden_contracts::tool::{Tool, ToolContext, ToolKind};

    use super::{RunShellCommand, OUTPUT_LIMIT_BYTES};

    fn shell() -> RunShellCommand {
        RunShellCommand::new(Duration::from_secs(10))
    }

    #[test]
    fn successful_command_reports_both_streams() {
        let dir = tempfile::tempdir().expect("tempdir");

        let out = shell()
            .execute(&json!({ "command": "echo hello" }), &ToolContext::new(dir.path()))
            .unwrap();
        assert_eq!(out, "STDOUT:\nhello\n\nSTDERR:\n\nExit Code: 0");
    }

    #[test]
    fn command_runs_in_the_work_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("marker.txt"), "").unwrap();

        let out = shell()
            .execute(&json!({ "command": "ls" }), &ToolContext::new(dir.path()))
            .unwrap();
        assert!(out.contains("marker.txt"), "{out}");
    }

    #[test]
    fn non_zero_exit_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");

        let out = shell()
            .execute(&json!({ "command": "echo oops >&2 && exit 3" }), &ToolContext::new(dir.path()))
            .unwrap();
        assert_eq!(out, "Error: Command failed with exit code 3.\nSTDOUT:\nNo stdout produced.\nSTDERR:\noops\n");
    }

    // ── Timeouts ─────────────────────────────────────────────────────────────

    #[test]
    fn timeout_kills_the_command() {
        let dir = tempfile::tempdir().expect("tempdir");
        let tool = RunShellCommand::new(Duration::from_secs(1));

        let out = tool
            .execute(&json!({ "command": "echo started; exec sleep 5" }), &ToolContext::new(dir.path()))
            .unwrap();
        assert!(out.starts_with("Error: Command timed out after 1 seconds.\nSTDOUT:\nstarted\n"), "{out}");
    }

    #[test]
    fn timeout_kills_every_process_in_a_pipeline() {
        let dir = tempfile::tempdir().expect("tempdir");
        let tool = RunShellCommand::new(Duration::from_secs(1));

        let started = Instant::now();
        let out = tool
            .execute(&json!({ "command": "sleep 6 | cat" }), &ToolContext::new(dir.path()))
            .unwrap();
        let elapsed = started.elapsed();

        assert!(elapsed < Duration::from_secs(4), "took {elapsed:?}: {out}");
        assert!(out.starts_with("Error: Command timed out after 1 seconds."), "{out}");
    }

    #[test]
    fn background_job_holding_the_pipes_is_bounded_by_the_timeout() {
        let dir = tempfile::tempdir().expect("tempdir");
        let tool = RunShellCommand::new(Duration::from_secs(1));

        let started = Instant::now();
        let out = tool
            .execute(&json!({ "command": "sleep 6 & echo started" }), &ToolContext::new(dir.path()))
            .unwrap();
        let elapsed = started.elapsed();

        assert!(elapsed < Duration::from_secs(4), "took {elapsed:?}: {out}");
        assert!(out.starts_with("Error: Command timed out after 1 seconds.\nSTDOUT:\nstarted\n"), "{out}");
    }

    // ── Output limit ─────────────────────────────────────────────────────────

    #[test]
    fn oversized_output_is_truncated_with_a_notice() {
        let dir = tempfile::tempdir().expect("tempdir");

        let out = shell()
            .execute(
                &json!({ "command": "head -c 100000 /dev/zero | tr '\\000' a" }),
                &ToolContext::new(dir.path()),
            )
            .unwrap();

        let kept = out.strip_prefix("STDOUT:\n").unwrap().split('\n').next().unwrap();
        assert_eq!(kept.len(), OUTPUT_LIMIT_BYTES);
        assert!(kept.bytes().all(|b| b == b'a'));
        let dropped = 100_000 - OUTPUT_LIMIT_BYTES;
        assert!(out.contains(&format!("\n[stdout truncated {dropped} bytes]\nSTDERR:")), "{}", &out[out.len() - 80..]);
        assert!(out.ends_with("Exit Code: 0"));
    }

    #[test]
    fn shell_tool_is_a_process_tool() {
        assert_eq!(shell().kind(), ToolKind::Process);
        assert_eq!(shell().name(), "run_shell_command");
    }
}
