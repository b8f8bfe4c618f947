// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Captured invocation data types.

use super::duration_ms;
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime};

/// One recorded tool invocation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InvocationRecord {
    /// Sequence number
    pub seq: u64,

    /// Wall-clock timestamp
    pub timestamp: SystemTime,

    /// Elapsed time since capture started
    #[serde(with = "duration_ms")]
    pub elapsed: Duration,

    /// What was run
    pub invocation: CapturedInvocation,

    /// How it ended
    pub outcome: CapturedOutcome,
}

/// The command line a step ran, with the scenario context it ran in
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedInvocation {
    pub scenario: String,
    pub step: String,
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<String>,
}

impl CapturedInvocation {
    /// Render the invocation as a copy-pasteable shell command line.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .map(shell_quote)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn shell_quote(word: &str) -> String {
    let plain = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:,+@%".contains(c));
    if plain {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

/// Captured outcome of an invocation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CapturedOutcome {
    Completed {
        /// `None` when the process was terminated by a signal
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
        #[serde(with = "duration_ms")]
        duration: Duration,
    },
    TimedOut {
        #[serde(with = "duration_ms")]
        after: Duration,
    },
    SpawnFailed {
        message: String,
    },
}

impl CapturedOutcome {
    /// True for a completed run that exited with status 0.
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            CapturedOutcome::Completed {
                exit_code: Some(0),
                ..
            }
        )
    }
}

#[cfg(test)]
#[path = "invocation_tests.rs"]
mod tests;
