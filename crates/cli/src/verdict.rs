// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Scenario verdicts, the per-scenario state machine, and the error
//! taxonomy that resolves into them.

use crate::artifact::ArtifactError;
use crate::assertions::AssertionMismatch;
use crate::process::ProcessError;
use serde::Serialize;
use thiserror::Error;

/// Terminal outcome of a scenario
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    Passed,
    Failed(Failure),
    Skipped(SkipReason),
}

impl Verdict {
    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Passed => "pass",
            Verdict::Failed(_) => "fail",
            Verdict::Skipped(_) => "skip",
        }
    }

    pub fn is_passed(&self) -> bool {
        matches!(self, Verdict::Passed)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Verdict::Failed(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Verdict::Skipped(_))
    }
}

/// Which step of a scenario a failure belongs to
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StepRef {
    /// Zero-based position in the scenario
    pub index: usize,
    pub label: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Non-zero exit, spawn failure, or unexpected stderr
    Process,
    /// The external process outlived its timeout
    Timeout,
    /// Output did not match the expectation
    Assertion,
    /// Working directory or artifact could not be prepared
    Setup,
    /// Probing an optional capability errored
    CapabilityProbe,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::Process => write!(f, "process error"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Assertion => write!(f, "assertion mismatch"),
            FailureKind::Setup => write!(f, "setup error"),
            FailureKind::CapabilityProbe => write!(f, "capability probe error"),
        }
    }
}

/// Diagnostic payload of a failed scenario
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Failure {
    pub kind: FailureKind,
    pub step: Option<StepRef>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
}

/// Why a scenario did not run. Every reason reports as "skip"; the
/// variants only change the diagnostic text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    ToolMissing { tool: String },
    CapabilityAbsent { capability: String, detail: String },
    PrerequisiteNotPassed { scenario: String },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::ToolMissing { tool } => write!(f, "tool '{}' not found", tool),
            SkipReason::CapabilityAbsent { capability, detail } => {
                write!(f, "capability '{}' unavailable: {}", capability, detail)
            }
            SkipReason::PrerequisiteNotPassed { scenario } => {
                write!(f, "prerequisite scenario '{}' did not pass", scenario)
            }
        }
    }
}

/// Everything that can stop a scenario
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("missing capability: {0}")]
    MissingCapability(SkipReason),

    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error(transparent)]
    AssertionMismatch(#[from] AssertionMismatch),

    #[error("setup failed: {0}")]
    Setup(String),

    #[error("probing capability '{capability}' failed: {message}")]
    CapabilityProbe { capability: String, message: String },
}

impl From<ArtifactError> for HarnessError {
    fn from(e: ArtifactError) -> Self {
        HarnessError::Setup(e.to_string())
    }
}

impl HarnessError {
    /// Resolve the error into the terminal verdict of its scenario.
    pub fn into_verdict(self, step: Option<StepRef>) -> Verdict {
        let message = self.to_string();
        let failure = |kind: FailureKind, actual: Option<String>, expected: Option<String>| {
            Verdict::Failed(Failure {
                kind,
                step: step.clone(),
                message: message.clone(),
                actual,
                expected,
            })
        };
        match self {
            HarnessError::MissingCapability(reason) => Verdict::Skipped(reason),
            HarnessError::Process(ProcessError::Timeout { .. }) => {
                failure(FailureKind::Timeout, None, None)
            }
            HarnessError::Process(ProcessError::UnexpectedExit {
                expected,
                actual,
                stderr,
            }) => {
                let mut actual = crate::process::describe_code(actual);
                if !stderr.trim().is_empty() {
                    actual = format!("{} (stderr: {})", actual, stderr.trim());
                }
                failure(FailureKind::Process, Some(actual), Some(expected))
            }
            HarnessError::Process(ProcessError::UnexpectedStderr { stderr }) => {
                failure(FailureKind::Process, Some(stderr), Some(String::new()))
            }
            HarnessError::Process(_) => failure(FailureKind::Process, None, None),
            HarnessError::AssertionMismatch(m) => {
                failure(FailureKind::Assertion, Some(m.actual), Some(m.expected))
            }
            HarnessError::Setup(_) => failure(FailureKind::Setup, None, None),
            HarnessError::CapabilityProbe { .. } => {
                failure(FailureKind::CapabilityProbe, None, None)
            }
        }
    }
}

/// Lifecycle of one scenario: `NotStarted -> Running -> terminal`.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum ScenarioState {
    #[default]
    NotStarted,
    Running,
    Finished(Verdict),
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("illegal scenario transition from {from} to {to}")]
pub struct StateError {
    pub from: &'static str,
    pub to: &'static str,
}

impl ScenarioState {
    fn name(&self) -> &'static str {
        match self {
            ScenarioState::NotStarted => "not-started",
            ScenarioState::Running => "running",
            ScenarioState::Finished(_) => "finished",
        }
    }

    /// `NotStarted -> Running`
    pub fn start(&mut self) -> Result<(), StateError> {
        match self {
            ScenarioState::NotStarted => {
                *self = ScenarioState::Running;
                Ok(())
            }
            other => Err(StateError {
                from: other.name(),
                to: "running",
            }),
        }
    }

    /// `Running -> Finished`. Terminal states never change.
    pub fn finish(&mut self, verdict: Verdict) -> Result<(), StateError> {
        match self {
            ScenarioState::Running => {
                *self = ScenarioState::Finished(verdict);
                Ok(())
            }
            other => Err(StateError {
                from: other.name(),
                to: "finished",
            }),
        }
    }

    pub fn verdict(&self) -> Option<&Verdict> {
        match self {
            ScenarioState::Finished(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ScenarioState::Finished(_))
    }
}

#[cfg(test)]
#[path = "verdict_tests.rs"]
mod tests;
