// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Suite loading, validation, and the compiled scenario registry.

use crate::artifact::Artifact;
use crate::assertions::{
    assert_no_stderr, assert_paths_exist, ExitExpectation, OutputCheck, OutputSpecError,
    StderrAllowList, StderrExpectation,
};
use crate::config::{
    ArtifactSpec, CapabilitySpec, ExpectSpec, ScenarioSpec, StepSpec, SuiteConfig,
    DEFAULT_DATA_DIR, DEFAULT_SCRATCH_DIR,
};
use crate::locate::SearchConfig;
use crate::normalize::{compile_rules, normalize, Normalizer};
use crate::process::CapturedRun;
use crate::verdict::HarnessError;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when loading a suite
#[derive(Debug, Error)]
pub enum SuiteError {
    #[error("Failed to read suite file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid regex pattern: {0}")]
    Regex(#[from] regex::Error),

    #[error("Invalid expectation in {context}: {source}")]
    Expectation {
        context: String,
        #[source]
        source: OutputSpecError,
    },

    #[error("Validation error: {0}")]
    Validation(String),
}

/// A loaded and validated suite file
#[derive(Debug)]
pub struct Suite {
    config: SuiteConfig,
    base_dir: PathBuf,
}

impl Suite {
    /// Load a suite from a TOML or JSON file.
    ///
    /// Relative `data_dir` and `search_paths` resolve against the suite
    /// file's directory.
    pub fn load(path: &Path) -> Result<Self, SuiteError> {
        let content = std::fs::read_to_string(path)?;
        let config: SuiteConfig = if path.extension().is_some_and(|e| e == "json") {
            serde_json::from_str(&content)?
        } else {
            toml::from_str(&content)?
        };
        let base_dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Self::from_config(config, base_dir)
    }

    /// Create a suite from a config object, validating it
    pub fn from_config(config: SuiteConfig, base_dir: impl Into<PathBuf>) -> Result<Self, SuiteError> {
        validate(&config)?;
        Ok(Self {
            config,
            base_dir: base_dir.into(),
        })
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &SuiteConfig {
        &self.config
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Resolve the directories a run uses. The work dir defaults to the
    /// suite file's directory; `data_dir` may start with `{work}`.
    pub fn layout(&self, work_dir: Option<&Path>) -> Layout {
        let base = absolute(&self.base_dir, None);
        let work_dir = match work_dir {
            Some(dir) => absolute(dir, None),
            None => base.clone(),
        };
        let data_template = self.config.data_dir.as_deref().unwrap_or(DEFAULT_DATA_DIR);
        let data_dir = absolute(
            Path::new(&data_template.replace("{work}", &work_dir.to_string_lossy())),
            Some(&base),
        );
        let scratch_dir = absolute(
            Path::new(
                self.config
                    .scratch_dir
                    .as_deref()
                    .unwrap_or(DEFAULT_SCRATCH_DIR),
            ),
            Some(&work_dir),
        );
        Layout {
            data_dir,
            work_dir,
            scratch_dir,
        }
    }

    /// Tool search configuration from the suite's `[tools]` and `search_paths`.
    pub fn search_config(&self, layout: &Layout) -> SearchConfig {
        let base = absolute(&self.base_dir, None);
        let mut search = SearchConfig::new();
        for (name, tool) in &self.config.tools {
            if let Some(ref path) = tool.path {
                search = search.with_tool(name, absolute(Path::new(&layout.expand(path)), Some(&base)));
            }
        }
        for dir in &self.config.search_paths {
            search = search.with_search_dir(absolute(Path::new(&layout.expand(dir)), Some(&base)));
        }
        search
    }

    /// Suite-wide settings for a run
    pub fn settings(&self, layout: &Layout) -> Result<SuiteSettings, SuiteError> {
        let artifacts = self
            .config
            .artifacts
            .iter()
            .map(|spec| resolve_artifact(spec, layout))
            .collect();
        let capabilities = self
            .config
            .capabilities
            .iter()
            .map(|(name, spec)| {
                let probe = match spec {
                    CapabilitySpec::Tool { tool, args, expect } => CapabilityProbe::Tool {
                        tool: tool.clone(),
                        args: args.iter().map(|a| layout.expand(a)).collect(),
                        expect: compile_expect(expect, layout, &format!("capability '{}'", name))?,
                    },
                    CapabilitySpec::Env { var } => CapabilityProbe::Env { var: var.clone() },
                };
                Ok((name.clone(), probe))
            })
            .collect::<Result<BTreeMap<_, _>, SuiteError>>()?;

        Ok(SuiteSettings {
            name: self.config.name.clone(),
            layout: layout.clone(),
            default_timeout: Duration::from_millis(self.config.timeout_ms),
            stderr_allow: StderrAllowList::new(&self.config.stderr_allow)?,
            artifacts,
            capabilities,
        })
    }
}

/// Directories a run reads from and writes to, all absolute
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layout {
    pub data_dir: PathBuf,
    pub work_dir: PathBuf,
    pub scratch_dir: PathBuf,
}

impl Layout {
    /// Replace `{data}`, `{scratch}` and `{work}` in a template.
    pub fn expand(&self, template: &str) -> String {
        template
            .replace("{data}", &self.data_dir.to_string_lossy())
            .replace("{scratch}", &self.scratch_dir.to_string_lossy())
            .replace("{work}", &self.work_dir.to_string_lossy())
    }

    /// Expand a template into a path; relative results are under the work dir.
    pub fn expand_path(&self, template: &str) -> PathBuf {
        absolute(Path::new(&self.expand(template)), Some(&self.work_dir))
    }
}

fn absolute(path: &Path, base: Option<&Path>) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match base {
        Some(base) => base.join(path),
        None => std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf()),
    }
}

/// How a capability is probed, with templates expanded
#[derive(Clone, Debug)]
pub enum CapabilityProbe {
    Tool {
        tool: String,
        args: Vec<String>,
        expect: Expectation,
    },
    Env {
        var: String,
    },
}

/// Suite-wide settings handed to the runner alongside the registry
#[derive(Clone, Debug)]
pub struct SuiteSettings {
    pub name: String,
    pub layout: Layout,
    pub default_timeout: Duration,
    pub stderr_allow: StderrAllowList,
    /// Shared artifacts, cleared before the first scenario and removed after the last
    pub artifacts: Vec<Artifact>,
    pub capabilities: BTreeMap<String, CapabilityProbe>,
}

/// Compiled expectation for one run
#[derive(Clone, Debug, Default)]
pub struct Expectation {
    pub exit: ExitExpectation,
    pub stdout: Option<OutputCheck>,
    pub stderr: StderrExpectation,
    pub artifact_exists: Vec<PathBuf>,
}

impl Expectation {
    /// Check a finished run in order: exit status, stderr, normalized stdout,
    /// then artifacts on disk.
    pub fn verify(
        &self,
        run: &CapturedRun,
        rules: &[Normalizer],
        allow: &StderrAllowList,
    ) -> Result<(), HarnessError> {
        self.exit.check(run)?;
        if self.stderr == StderrExpectation::Empty {
            assert_no_stderr(&run.stderr, allow)?;
        }
        if let Some(ref check) = self.stdout {
            check.check(&normalize(&run.stdout, rules))?;
        }
        assert_paths_exist(&self.artifact_exists)?;
        Ok(())
    }
}

/// What a step does
#[derive(Clone, Debug)]
pub enum StepAction {
    Run { tool: String, args: Vec<String> },
    Remove(Artifact),
}

/// A compiled step
#[derive(Clone, Debug)]
pub struct Step {
    pub label: String,
    pub action: StepAction,
    pub expect: Expectation,
    pub timeout: Option<Duration>,
    pub best_effort: bool,
    pub normalize: Vec<Normalizer>,
    pub stderr_allow: StderrAllowList,
    pub produces: Option<Artifact>,
}

impl Step {
    /// Tool this step runs, if any
    pub fn tool(&self) -> Option<&str> {
        match &self.action {
            StepAction::Run { tool, .. } => Some(tool.as_str()),
            StepAction::Remove(_) => None,
        }
    }
}

/// A compiled scenario
#[derive(Clone, Debug)]
pub struct Scenario {
    pub name: String,
    pub description: Option<String>,
    pub requires: Vec<String>,
    pub after: Vec<String>,
    /// Artifacts removed when the scenario ends
    pub artifacts: Vec<Artifact>,
    pub steps: Vec<Step>,
}

impl Scenario {
    /// Distinct tools the scenario runs, in first-use order
    pub fn tools(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for tool in self.steps.iter().filter_map(Step::tool) {
            if !seen.contains(&tool) {
                seen.push(tool);
            }
        }
        seen
    }
}

/// Ordered scenarios for one run
#[derive(Clone, Debug, Default)]
pub struct ScenarioRegistry {
    scenarios: Vec<Scenario>,
}

impl ScenarioRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile every scenario of a suite against a layout.
    pub fn build(suite: &Suite, layout: &Layout) -> Result<Self, SuiteError> {
        let shared: Vec<Artifact> = suite
            .config()
            .artifacts
            .iter()
            .map(|spec| resolve_artifact(spec, layout))
            .collect();
        let mut registry = Self::new();
        for spec in &suite.config().scenarios {
            registry.register(compile_scenario(spec, &shared, layout)?)?;
        }
        Ok(registry)
    }

    /// Append a scenario. Names are unique and `after` must name a scenario
    /// registered earlier.
    pub fn register(&mut self, scenario: Scenario) -> Result<(), SuiteError> {
        if self.get(&scenario.name).is_some() {
            return Err(SuiteError::Validation(format!(
                "duplicate scenario name '{}'",
                scenario.name
            )));
        }
        if let Some(missing) = scenario.after.iter().find(|dep| self.get(dep).is_none()) {
            return Err(SuiteError::Validation(format!(
                "scenario '{}' runs after '{}', which is not an earlier scenario",
                scenario.name, missing
            )));
        }
        self.scenarios.push(scenario);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Scenario> {
        self.scenarios.iter().find(|s| s.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Scenario> {
        self.scenarios.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.scenarios.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    /// Keep only scenarios whose name contains `pattern`, in order.
    pub fn filtered(self, pattern: &str) -> Self {
        Self {
            scenarios: self
                .scenarios
                .into_iter()
                .filter(|s| s.name.contains(pattern))
                .collect(),
        }
    }
}

fn resolve_artifact(spec: &ArtifactSpec, layout: &Layout) -> Artifact {
    Artifact::new(layout.expand_path(&spec.path)).with_companions(spec.companions.iter().cloned())
}

/// Find a declared artifact by expanded path, or make a bare one.
fn artifact_for(template: &str, declared: &[Artifact], layout: &Layout) -> Artifact {
    let path = layout.expand_path(template);
    declared
        .iter()
        .find(|a| a.path() == path)
        .cloned()
        .unwrap_or_else(|| Artifact::new(path))
}

fn compile_scenario(
    spec: &ScenarioSpec,
    shared: &[Artifact],
    layout: &Layout,
) -> Result<Scenario, SuiteError> {
    let own: Vec<Artifact> = spec
        .artifacts
        .iter()
        .map(|a| resolve_artifact(a, layout))
        .collect();
    let declared: Vec<Artifact> = own.iter().chain(shared.iter()).cloned().collect();

    let steps = spec
        .steps
        .iter()
        .enumerate()
        .map(|(index, step)| compile_step(&spec.name, index, step, &declared, layout))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Scenario {
        name: spec.name.clone(),
        description: spec.description.clone(),
        requires: spec.requires.clone(),
        after: spec.after.clone(),
        artifacts: own,
        steps,
    })
}

fn compile_step(
    scenario: &str,
    index: usize,
    spec: &StepSpec,
    declared: &[Artifact],
    layout: &Layout,
) -> Result<Step, SuiteError> {
    let context = format!("scenario '{}' step {}", scenario, index + 1);
    let (action, default_label) = match (&spec.tool, &spec.remove) {
        (Some(tool), None) => (
            StepAction::Run {
                tool: tool.clone(),
                args: spec.args.iter().map(|a| layout.expand(a)).collect(),
            },
            tool.clone(),
        ),
        (None, Some(remove)) => (
            StepAction::Remove(artifact_for(remove, declared, layout)),
            format!("remove {}", remove),
        ),
        // validate() rejects both other shapes before compilation
        _ => {
            return Err(SuiteError::Validation(format!(
                "{}: a step needs exactly one of `tool` or `remove`",
                context
            )))
        }
    };

    Ok(Step {
        label: spec.name.clone().unwrap_or(default_label),
        action,
        expect: compile_expect(&spec.expect, layout, &context)?,
        timeout: spec.timeout_ms.map(Duration::from_millis),
        best_effort: spec.best_effort,
        normalize: compile_rules(&spec.normalize)?,
        stderr_allow: StderrAllowList::new(&spec.stderr_allow)?,
        produces: spec
            .produces
            .as_deref()
            .map(|p| artifact_for(p, declared, layout)),
    })
}

fn compile_expect(
    spec: &ExpectSpec,
    layout: &Layout,
    context: &str,
) -> Result<Expectation, SuiteError> {
    let stdout = spec
        .stdout
        .as_ref()
        .map(|s| s.compile())
        .transpose()
        .map_err(|source| SuiteError::Expectation {
            context: context.to_string(),
            source,
        })?;
    Ok(Expectation {
        exit: spec.exit,
        stdout,
        stderr: spec.stderr,
        artifact_exists: spec
            .artifact_exists
            .iter()
            .map(|p| layout.expand_path(p))
            .collect(),
    })
}

/// Structural checks that do not need a layout.
fn validate(config: &SuiteConfig) -> Result<(), SuiteError> {
    if config.timeout_ms == 0 {
        return Err(SuiteError::Validation(
            "timeout_ms must be positive".to_string(),
        ));
    }
    for pattern in &config.stderr_allow {
        regex::Regex::new(pattern)?;
    }
    for (name, spec) in &config.capabilities {
        match spec {
            CapabilitySpec::Tool { tool, expect, .. } => {
                if tool.trim().is_empty() {
                    return Err(SuiteError::Validation(format!(
                        "capability '{}' has an empty tool name",
                        name
                    )));
                }
                validate_expect(expect, &format!("capability '{}'", name))?;
            }
            CapabilitySpec::Env { var } => {
                if var.trim().is_empty() {
                    return Err(SuiteError::Validation(format!(
                        "capability '{}' has an empty variable name",
                        name
                    )));
                }
            }
        }
    }

    let suite_artifacts: Vec<&str> = config.artifacts.iter().map(|a| a.path.as_str()).collect();
    let mut seen = HashSet::new();
    for scenario in &config.scenarios {
        if scenario.name.trim().is_empty() {
            return Err(SuiteError::Validation(
                "scenario names cannot be empty".to_string(),
            ));
        }
        if !seen.insert(scenario.name.as_str()) {
            return Err(SuiteError::Validation(format!(
                "duplicate scenario name '{}'",
                scenario.name
            )));
        }
        for dep in &scenario.after {
            if dep == &scenario.name || !seen.contains(dep.as_str()) {
                return Err(SuiteError::Validation(format!(
                    "scenario '{}' runs after '{}', which is not an earlier scenario",
                    scenario.name, dep
                )));
            }
        }
        for cap in &scenario.requires {
            if !config.capabilities.contains_key(cap) {
                return Err(SuiteError::Validation(format!(
                    "scenario '{}' requires undeclared capability '{}'",
                    scenario.name, cap
                )));
            }
        }
        if scenario.steps.is_empty() {
            return Err(SuiteError::Validation(format!(
                "scenario '{}' has no steps",
                scenario.name
            )));
        }
        validate_steps(scenario, &suite_artifacts)?;
    }
    Ok(())
}

fn validate_steps(scenario: &ScenarioSpec, suite_artifacts: &[&str]) -> Result<(), SuiteError> {
    let mut known: Vec<&str> = suite_artifacts.to_vec();
    known.extend(scenario.artifacts.iter().map(|a| a.path.as_str()));
    known.extend(scenario.steps.iter().filter_map(|s| s.produces.as_deref()));

    for (index, step) in scenario.steps.iter().enumerate() {
        let context = format!("scenario '{}' step {}", scenario.name, index + 1);
        match (&step.tool, &step.remove) {
            (Some(tool), None) => {
                if tool.trim().is_empty() {
                    return Err(SuiteError::Validation(format!("{}: empty tool name", context)));
                }
            }
            (None, Some(remove)) => {
                if !known.contains(&remove.as_str()) {
                    return Err(SuiteError::Validation(format!(
                        "{}: removes '{}', which is not a declared or produced artifact",
                        context, remove
                    )));
                }
                if !step.args.is_empty() {
                    return Err(SuiteError::Validation(format!(
                        "{}: a remove step takes no args",
                        context
                    )));
                }
            }
            _ => {
                return Err(SuiteError::Validation(format!(
                    "{}: a step needs exactly one of `tool` or `remove`",
                    context
                )))
            }
        }
        if step.timeout_ms == Some(0) {
            return Err(SuiteError::Validation(format!(
                "{}: timeout_ms must be positive",
                context
            )));
        }
        for pattern in &step.stderr_allow {
            regex::Regex::new(pattern)?;
        }
        compile_rules(&step.normalize)?;
        validate_expect(&step.expect, &context)?;
    }
    Ok(())
}

fn validate_expect(expect: &ExpectSpec, context: &str) -> Result<(), SuiteError> {
    if let Some(ref stdout) = expect.stdout {
        stdout.compile().map_err(|source| SuiteError::Expectation {
            context: context.to_string(),
            source,
        })?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "scenario_tests.rs"]
mod tests;
