// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! External process invocation with captured output.

use cliconform_capture::{CaptureLog, CapturedInvocation, CapturedOutcome};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::process::Command;

/// Default per-step timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 60_000;

/// Spawn attempts made when the executable is momentarily busy (ETXTBSY)
const SPAWN_ATTEMPTS: u32 = 3;

/// A fully resolved command line
#[derive(Clone, Debug)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub timeout: Duration,
}

impl Invocation {
    /// Create an invocation with the default timeout
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Describe this invocation for a capture log.
    pub fn captured(&self, scenario: &str, step: &str) -> CapturedInvocation {
        CapturedInvocation {
            scenario: scenario.to_string(),
            step: step.to_string(),
            program: self.program.display().to_string(),
            args: self.args.clone(),
            cwd: self.cwd.as_ref().map(|p| p.display().to_string()),
        }
    }
}

/// Output of a process that ran to completion
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CapturedRun {
    /// `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

impl CapturedRun {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' timed out after {}ms", .after.as_millis())]
    Timeout { program: String, after: Duration },

    #[error("I/O error while waiting for '{program}': {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unexpected exit status: expected {expected}, got {}", describe_code(*.actual))]
    UnexpectedExit {
        expected: String,
        actual: Option<i32>,
        stderr: String,
    },

    #[error("got error/warning on stderr: \"{stderr}\"")]
    UnexpectedStderr { stderr: String },
}

impl ProcessError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ProcessError::Timeout { .. })
    }

    /// The outcome to record in a capture log for errors raised before the
    /// process produced output.
    pub fn captured_outcome(&self) -> Option<CapturedOutcome> {
        match self {
            ProcessError::Spawn { source, .. } | ProcessError::Io { source, .. } => {
                Some(CapturedOutcome::SpawnFailed {
                    message: source.to_string(),
                })
            }
            ProcessError::Timeout { after, .. } => {
                Some(CapturedOutcome::TimedOut { after: *after })
            }
            _ => None,
        }
    }
}

pub(crate) fn describe_code(code: Option<i32>) -> String {
    match code {
        Some(c) => format!("exit code {}", c),
        None => "termination by signal".to_string(),
    }
}

impl From<&CapturedRun> for CapturedOutcome {
    fn from(run: &CapturedRun) -> Self {
        CapturedOutcome::Completed {
            exit_code: run.exit_code,
            stdout: run.stdout.clone(),
            stderr: run.stderr.clone(),
            duration: run.duration,
        }
    }
}

/// Run a program to completion and capture its output.
///
/// No shell is involved: arguments are passed as-is. Stdin is closed. The
/// child is killed if it outlives `invocation.timeout`.
pub async fn run_capture(invocation: &Invocation) -> Result<CapturedRun, ProcessError> {
    let program = invocation.program.display().to_string();
    let started = Instant::now();

    let child = spawn_with_retry(invocation).await.map_err(|source| ProcessError::Spawn {
        program: program.clone(),
        source,
    })?;

    // kill_on_drop(true) kills the child when the timed-out future drops it
    let output = match tokio::time::timeout(invocation.timeout, child.wait_with_output()).await {
        Ok(result) => result.map_err(|source| ProcessError::Io {
            program: program.clone(),
            source,
        })?,
        Err(_) => {
            return Err(ProcessError::Timeout {
                program,
                after: invocation.timeout,
            })
        }
    };

    let run = CapturedRun {
        exit_code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        duration: started.elapsed(),
    };
    tracing::debug!(
        program = %program,
        exit_code = ?run.exit_code,
        duration_ms = run.duration.as_millis() as u64,
        "process finished"
    );
    Ok(run)
}

async fn spawn_with_retry(invocation: &Invocation) -> std::io::Result<tokio::process::Child> {
    let mut attempt = 1;
    loop {
        match build_command(invocation).spawn() {
            Ok(child) => return Ok(child),
            Err(e) if is_text_file_busy(&e) && attempt < SPAWN_ATTEMPTS => {
                tracing::debug!(attempt, "executable busy, retrying spawn");
                tokio::time::sleep(Duration::from_millis(50 * u64::from(attempt))).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

fn build_command(invocation: &Invocation) -> Command {
    let mut cmd = Command::new(&invocation.program);
    cmd.args(&invocation.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(ref cwd) = invocation.cwd {
        cmd.current_dir(cwd);
    }
    cmd
}

#[cfg(unix)]
fn is_text_file_busy(e: &std::io::Error) -> bool {
    // ETXTBSY on Linux and macOS
    e.raw_os_error() == Some(26)
}

#[cfg(not(unix))]
fn is_text_file_busy(_e: &std::io::Error) -> bool {
    false
}

/// Append the result of [`run_capture`] to a capture log.
pub fn record_result(
    log: &CaptureLog,
    invocation: CapturedInvocation,
    result: &Result<CapturedRun, ProcessError>,
) {
    let outcome = match result {
        Ok(run) => Some(CapturedOutcome::from(run)),
        Err(e) => e.captured_outcome(),
    };
    if let Some(outcome) = outcome {
        let seq = log.record(invocation, outcome);
        tracing::trace!(seq, "recorded invocation");
    }
}

/// Display helper for a program path in diagnostics.
pub fn program_name(program: &Path) -> String {
    program
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| program.display().to_string())
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
