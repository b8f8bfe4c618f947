// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Suite configuration types for TOML/JSON suite files.

use crate::assertions::{ExitExpectation, OutputSpec, StderrExpectation};
use crate::normalize::NormalizationRule;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default input data directory, relative to the suite file
pub const DEFAULT_DATA_DIR: &str = "data";
/// Default scratch directory, relative to the work dir
pub const DEFAULT_SCRATCH_DIR: &str = "tmp";

fn default_timeout_ms() -> u64 {
    crate::process::DEFAULT_TIMEOUT_MS
}

/// Top-level suite configuration
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SuiteConfig {
    /// Name for logging and reports
    #[serde(default)]
    pub name: String,

    /// Input datasets, relative to the suite file (default: "data").
    /// `{work}` expands to the work dir.
    #[serde(default)]
    pub data_dir: Option<String>,

    /// Artifact directory, relative to the work dir (default: "tmp")
    #[serde(default)]
    pub scratch_dir: Option<String>,

    /// Default per-step timeout in milliseconds (default: 60000)
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Directories searched for tools before the environment
    #[serde(default)]
    pub search_paths: Vec<String>,

    /// Stderr regexes allowed for every step
    #[serde(default)]
    pub stderr_allow: Vec<String>,

    /// Tool declarations keyed by the name steps use
    #[serde(default)]
    pub tools: BTreeMap<String, ToolSpec>,

    /// Optional capabilities scenarios may require
    #[serde(default)]
    pub capabilities: BTreeMap<String, CapabilitySpec>,

    /// Artifacts shared across scenarios, removed when the suite ends
    #[serde(default)]
    pub artifacts: Vec<ArtifactSpec>,

    /// Scenarios in execution order
    #[serde(default)]
    pub scenarios: Vec<ScenarioSpec>,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            data_dir: None,
            scratch_dir: None,
            timeout_ms: default_timeout_ms(),
            search_paths: Vec::new(),
            stderr_allow: Vec::new(),
            tools: BTreeMap::new(),
            capabilities: BTreeMap::new(),
            artifacts: Vec::new(),
            scenarios: Vec::new(),
        }
    }
}

/// Declaration of an external tool
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ToolSpec {
    /// Explicit executable path
    #[serde(default)]
    pub path: Option<String>,
}

/// How to decide whether an optional capability is present
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(tag = "probe", rename_all = "snake_case")]
pub enum CapabilitySpec {
    /// Run a tool; the capability is present when it meets the expectation
    Tool {
        tool: String,
        #[serde(default)]
        args: Vec<String>,
        #[serde(default)]
        expect: ExpectSpec,
    },
    /// Present when the variable is set to something other than
    /// "", "0", "false", "no" or "off"
    Env { var: String },
}

/// An artifact path with companion files
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ArtifactSpec {
    /// Path template, e.g. "{scratch}/parts.shp"
    pub path: String,

    /// Companion extensions removed with the artifact, or "*"
    #[serde(default)]
    pub companions: Vec<String>,
}

/// One scenario
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioSpec {
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Capabilities that must be present, otherwise the scenario is skipped
    #[serde(default)]
    pub requires: Vec<String>,

    /// Earlier scenarios that must have passed
    #[serde(default)]
    pub after: Vec<String>,

    /// Artifacts removed when this scenario ends
    #[serde(default)]
    pub artifacts: Vec<ArtifactSpec>,

    pub steps: Vec<StepSpec>,
}

/// One step: either `tool` (run it) or `remove` (delete an artifact)
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StepSpec {
    /// Label for reports (default: the tool name or "remove")
    #[serde(default)]
    pub name: Option<String>,

    /// Tool to run
    #[serde(default)]
    pub tool: Option<String>,

    /// Arguments, with `{data}`, `{scratch}` and `{work}` placeholders
    #[serde(default)]
    pub args: Vec<String>,

    /// Artifact path template to delete
    #[serde(default)]
    pub remove: Option<String>,

    /// Artifact this step creates; stale copies are deleted first
    #[serde(default)]
    pub produces: Option<String>,

    #[serde(default)]
    pub expect: ExpectSpec,

    /// Timeout override in milliseconds
    #[serde(default)]
    pub timeout_ms: Option<u64>,

    /// Runs even after an earlier step failed; its own failure is ignored
    #[serde(default)]
    pub best_effort: bool,

    /// Rules applied to stdout before comparison
    #[serde(default)]
    pub normalize: Vec<NormalizationRule>,

    /// Extra stderr regexes allowed for this step
    #[serde(default)]
    pub stderr_allow: Vec<String>,
}

/// What a step's run must look like
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ExpectSpec {
    #[serde(default)]
    pub exit: ExitExpectation,

    #[serde(default)]
    pub stdout: Option<OutputSpec>,

    #[serde(default)]
    pub stderr: StderrExpectation,

    /// Path templates that must exist after the step
    #[serde(default)]
    pub artifact_exists: Vec<String>,
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
