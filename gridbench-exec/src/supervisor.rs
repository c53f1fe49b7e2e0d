//! Process Supervisor
//!
//! Launches one external command as the leader of a new process group,
//! captures its output under a byte ceiling, enforces a wall-clock deadline
//! with a dedicated timer, and classifies the outcome as one of the
//! `BenchError` variants (or success with captured stdout).

use crate::registry::ProcessRegistry;
use gridbench_core::BenchError;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};

/// Output ceiling per invocation, stdout and stderr combined (32 MiB).
///
/// Tuned to accommodate pathological but legitimate output; anything beyond
/// it force-kills the process group.
pub const DEFAULT_OUTPUT_LIMIT: usize = 32 * 1024 * 1024;

/// One external-program call. Immutable once constructed; owned by the
/// `Supervisor::run` call that issues it.
#[derive(Debug, Clone)]
pub struct CommandInvocation {
    /// Executable path or name (resolved via PATH).
    pub program: String,
    /// Argument list.
    pub args: Vec<String>,
    /// Working directory.
    pub cwd: PathBuf,
    /// Wall-clock deadline for the whole invocation.
    pub timeout: Duration,
}

impl CommandInvocation {
    /// Build an invocation with no arguments.
    pub fn new(program: impl Into<String>, cwd: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.into(),
            timeout,
        }
    }

    /// Append arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

/// Force-kill a child and everything it spawned.
///
/// Two-step ordered strategy: signal the whole process group first, and if
/// that fails (already reaped, or the platform denies it) fall back to the
/// leader pid. All signal errors are swallowed.
#[cfg(unix)]
pub fn terminate(pid: u32) {
    unsafe {
        if libc::kill(-(pid as libc::pid_t), libc::SIGKILL) != 0 {
            let _ = libc::kill(pid as libc::pid_t, libc::SIGKILL);
        }
    }
}

/// Non-Unix fallback: process groups are unavailable, so termination is
/// handled by `kill_on_drop` on the child handle alone.
#[cfg(not(unix))]
pub fn terminate(_pid: u32) {}

/// Launches external commands under resource bounds and classifies results.
pub struct Supervisor {
    registry: Arc<ProcessRegistry>,
    output_limit: usize,
}

impl Supervisor {
    /// Create a supervisor using the shared active-process registry.
    pub fn new(registry: Arc<ProcessRegistry>) -> Self {
        Self {
            registry,
            output_limit: DEFAULT_OUTPUT_LIMIT,
        }
    }

    /// Override the captured-output ceiling.
    pub fn with_output_limit(mut self, limit: usize) -> Self {
        self.output_limit = limit;
        self
    }

    /// Run one command to completion under the invocation's limits.
    ///
    /// Returns captured stdout on exit code 0. Every other outcome maps to a
    /// `BenchError` variant: `Spawn`, `ProcessFailed`, `OutputOverflow` or
    /// `Timeout`. The child is registered in the process registry for the
    /// duration of the call and deregistered exactly once on any terminal
    /// outcome.
    pub async fn run(&self, invocation: CommandInvocation) -> Result<String, BenchError> {
        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .current_dir(&invocation.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = cmd.spawn().map_err(|e| BenchError::Spawn {
            program: invocation.program.clone(),
            message: e.to_string(),
            not_found: e.kind() == std::io::ErrorKind::NotFound,
        })?;

        // Register for the interrupt path; the guard deregisters once, on
        // every exit route out of this function.
        let _active = child.id().map(|pid| self.registry.register(pid));

        tracing::debug!(program = %invocation.program, "spawned");
        self.supervise(&mut child, &invocation).await
    }

    async fn supervise(
        &self,
        child: &mut Child,
        invocation: &CommandInvocation,
    ) -> Result<String, BenchError> {
        let pid = child.id();

        // Both pipes exist by construction (Stdio::piped above).
        let mut stdout = child.stdout.take().expect("stdout was configured as piped");
        let mut stderr = child.stderr.take().expect("stderr was configured as piped");

        // Dedicated deadline timer, armed at spawn time.
        let deadline = tokio::time::sleep(invocation.timeout);
        tokio::pin!(deadline);

        let mut stdout_buf: Vec<u8> = Vec::new();
        let mut stderr_buf: Vec<u8> = Vec::new();
        let mut stdout_open = true;
        let mut stderr_open = true;
        let mut out_chunk = [0u8; 8192];
        let mut err_chunk = [0u8; 8192];

        // Exactly one branch resolves the invocation; the deadline and the
        // happy path cannot both fire because the first one returns.
        loop {
            tokio::select! {
                _ = &mut deadline => {
                    self.kill_and_reap(child, pid).await;
                    return Err(BenchError::Timeout {
                        timeout: invocation.timeout,
                    });
                }
                read = stdout.read(&mut out_chunk), if stdout_open => {
                    match read {
                        Ok(0) | Err(_) => stdout_open = false,
                        Ok(n) => {
                            stdout_buf.extend_from_slice(&out_chunk[..n]);
                            if stdout_buf.len() + stderr_buf.len() > self.output_limit {
                                self.kill_and_reap(child, pid).await;
                                return Err(BenchError::OutputOverflow {
                                    captured: stdout_buf.len() + stderr_buf.len(),
                                    limit: self.output_limit,
                                });
                            }
                        }
                    }
                }
                read = stderr.read(&mut err_chunk), if stderr_open => {
                    match read {
                        Ok(0) | Err(_) => stderr_open = false,
                        Ok(n) => {
                            stderr_buf.extend_from_slice(&err_chunk[..n]);
                            if stdout_buf.len() + stderr_buf.len() > self.output_limit {
                                self.kill_and_reap(child, pid).await;
                                return Err(BenchError::OutputOverflow {
                                    captured: stdout_buf.len() + stderr_buf.len(),
                                    limit: self.output_limit,
                                });
                            }
                        }
                    }
                }
                status = child.wait(), if !stdout_open && !stderr_open => {
                    return classify_exit(status, stdout_buf, stderr_buf);
                }
            }
        }
    }

    /// Terminate the process group and reap the child so no zombie remains.
    async fn kill_and_reap(&self, child: &mut Child, pid: Option<u32>) {
        if let Some(pid) = pid {
            terminate(pid);
        } else {
            let _ = child.start_kill();
        }
        let _ = child.wait().await;
    }
}

/// Classify a normal exit: code 0 is success with captured stdout; anything
/// else is a failure carrying trimmed stderr, falling back to trimmed stdout,
/// falling back to a generic message.
fn classify_exit(
    status: std::io::Result<std::process::ExitStatus>,
    stdout_buf: Vec<u8>,
    stderr_buf: Vec<u8>,
) -> Result<String, BenchError> {
    let status = status.map_err(|e| BenchError::ProcessFailed {
        code: None,
        message: format!("failed to collect exit status: {e}"),
    })?;

    if status.success() {
        return Ok(String::from_utf8_lossy(&stdout_buf).into_owned());
    }

    let stderr_text = String::from_utf8_lossy(&stderr_buf).trim().to_string();
    let stdout_text = String::from_utf8_lossy(&stdout_buf).trim().to_string();
    let message = if !stderr_text.is_empty() {
        stderr_text
    } else if !stdout_text.is_empty() {
        stdout_text
    } else {
        "command failed".to_string()
    };

    Err(BenchError::ProcessFailed {
        code: status.code(),
        message,
    })
}
