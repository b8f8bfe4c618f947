// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Optional capability probing.
//!
//! A capability is either a tool invocation that must meet an expectation
//! or an environment variable that must be set. Absence skips the
//! scenarios that require it; a probe that cannot run at all is an error
//! and fails them.

use crate::assertions::StderrAllowList;
use crate::env;
use crate::locate::ToolLocator;
use crate::process::{record_result, run_capture, Invocation, ProcessError};
use crate::scenario::CapabilityProbe;
use cliconform_capture::CaptureLog;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::time::Duration;

/// Values of an `env` probe variable that count as unset
const FALSY: &[&str] = &["", "0", "false", "no", "off"];

/// Scenario name used for probe invocations in the capture log
pub const PROBE_SCENARIO: &str = "<capability probe>";

/// Result of probing one capability
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CapabilityStatus {
    Available,
    /// The probe ran and the capability is not there
    Absent(String),
    /// The probe itself could not run
    ProbeError(String),
}

impl CapabilityStatus {
    pub fn is_available(&self) -> bool {
        matches!(self, CapabilityStatus::Available)
    }
}

/// Memoizing capability prober
pub struct CapabilityProber {
    probes: BTreeMap<String, CapabilityProbe>,
    cache: HashMap<String, CapabilityStatus>,
    default_timeout: Duration,
    cwd: Option<PathBuf>,
    capture: Option<CaptureLog>,
}

impl CapabilityProber {
    pub fn new(probes: BTreeMap<String, CapabilityProbe>, default_timeout: Duration) -> Self {
        Self {
            probes,
            cache: HashMap::new(),
            default_timeout,
            cwd: None,
            capture: None,
        }
    }

    /// Run tool probes in this directory
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Record tool probe invocations
    pub fn with_capture(mut self, capture: CaptureLog) -> Self {
        self.capture = Some(capture);
        self
    }

    /// Probe a capability once per run; later calls return the cached status.
    pub async fn probe(&mut self, name: &str, locator: &mut ToolLocator) -> CapabilityStatus {
        if let Some(status) = self.cache.get(name) {
            return status.clone();
        }
        let status = match self.probes.get(name) {
            None => CapabilityStatus::ProbeError(format!("capability '{}' is not declared", name)),
            Some(CapabilityProbe::Env { var }) => probe_env(var),
            Some(CapabilityProbe::Tool { tool, args, expect }) => match locator.locate(tool) {
                None => CapabilityStatus::Absent(format!("tool '{}' not found", tool)),
                Some(program) => {
                    let mut invocation = Invocation::new(program)
                        .args(args.iter().cloned())
                        .timeout(self.default_timeout);
                    if let Some(ref cwd) = self.cwd {
                        invocation = invocation.cwd(cwd);
                    }
                    let result = run_capture(&invocation).await;
                    if let Some(ref log) = self.capture {
                        record_result(log, invocation.captured(PROBE_SCENARIO, name), &result);
                    }
                    match result {
                        Err(e @ (ProcessError::Spawn { .. }
                        | ProcessError::Timeout { .. }
                        | ProcessError::Io { .. })) => CapabilityStatus::ProbeError(e.to_string()),
                        Err(e) => CapabilityStatus::Absent(e.to_string()),
                        Ok(run) => match expect.verify(&run, &[], &StderrAllowList::default()) {
                            Ok(()) => CapabilityStatus::Available,
                            Err(e) => CapabilityStatus::Absent(e.to_string()),
                        },
                    }
                }
            },
        };
        match status {
            CapabilityStatus::Available => tracing::debug!(capability = name, "capability available"),
            CapabilityStatus::Absent(ref reason) => {
                tracing::info!(capability = name, %reason, "capability absent")
            }
            CapabilityStatus::ProbeError(ref error) => {
                tracing::warn!(capability = name, %error, "capability probe failed")
            }
        }
        self.cache.insert(name.to_string(), status.clone());
        status
    }
}

fn probe_env(var: &str) -> CapabilityStatus {
    match env::capability_var(var) {
        None => CapabilityStatus::Absent(format!("{} is not set", var)),
        Some(value) if FALSY.contains(&value.trim().to_ascii_lowercase().as_str()) => {
            CapabilityStatus::Absent(format!("{}={:?}", var, value))
        }
        Some(_) => CapabilityStatus::Available,
    }
}

#[cfg(test)]
#[path = "capability_tests.rs"]
mod tests;
