// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sequential suite execution.
//!
//! Scenarios run one after another in registry order; the steps of a
//! scenario run one after another and the first failing step ends the
//! scenario. Best-effort steps (and `remove` steps) still run after a
//! failure, and their own errors are only logged. Every error is resolved
//! into a [`Verdict`] at the scenario boundary, so one scenario failing never
//! stops the next one from running.

use crate::artifact::ArtifactScope;
use crate::capability::{CapabilityProber, CapabilityStatus};
use crate::locate::ToolLocator;
use crate::process::{program_name, record_result, run_capture, Invocation};
use crate::report::{ScenarioReport, SuiteReport};
use crate::scenario::{Scenario, ScenarioRegistry, Step, StepAction, SuiteSettings};
use crate::verdict::{HarnessError, ScenarioState, SkipReason, StepRef, Verdict};
use cliconform_capture::CaptureLog;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Instant;
use tracing::Instrument;

/// Runs a registry of scenarios against one suite's settings
pub struct Runner {
    registry: ScenarioRegistry,
    settings: SuiteSettings,
    locator: ToolLocator,
    prober: CapabilityProber,
    capture: CaptureLog,
}

impl Runner {
    pub fn new(registry: ScenarioRegistry, settings: SuiteSettings, locator: ToolLocator) -> Self {
        let capture = CaptureLog::new();
        let prober = CapabilityProber::new(settings.capabilities.clone(), settings.default_timeout)
            .with_cwd(settings.layout.work_dir.clone())
            .with_capture(capture.clone());
        Self {
            registry,
            settings,
            locator,
            prober,
            capture,
        }
    }

    /// Record invocations into this log instead of a private one
    pub fn with_capture(mut self, capture: CaptureLog) -> Self {
        self.prober = self.prober.with_capture(capture.clone());
        self.capture = capture;
        self
    }

    pub fn capture(&self) -> &CaptureLog {
        &self.capture
    }

    /// Run every scenario and report their verdicts.
    pub async fn run(mut self) -> SuiteReport {
        let mut report = SuiteReport::new(self.settings.name.clone());
        let span = tracing::info_span!("suite", name = %self.settings.name, run_id = %report.run_id);

        async {
            tracing::info!(scenarios = self.registry.len(), "suite started");

            let mut suite_scope = ArtifactScope::new();
            let setup_error = self.setup(&mut suite_scope).await.err();
            if let Some(ref error) = setup_error {
                tracing::error!(%error, "suite setup failed");
            }

            let registry = std::mem::take(&mut self.registry);
            let mut passed: HashMap<String, bool> = HashMap::new();
            for scenario in registry.iter() {
                let result = self
                    .run_scenario(scenario, &passed, &suite_scope, setup_error.as_ref())
                    .await;
                passed.insert(scenario.name.clone(), result.verdict.is_passed());
                report.push(result);
            }

            // Dropping the scope removes the suite artifacts
            drop(suite_scope);
            tracing::info!(
                passed = report.passed(),
                failed = report.failed(),
                skipped = report.skipped(),
                "suite finished"
            );
        }
        .instrument(span)
        .await;

        report
    }

    /// Create the scratch dir and clear stale suite artifacts.
    async fn setup(&self, scope: &mut ArtifactScope) -> Result<(), String> {
        let scratch = &self.settings.layout.scratch_dir;
        tokio::fs::create_dir_all(scratch)
            .await
            .map_err(|e| format!("cannot create scratch dir {}: {}", scratch.display(), e))?;
        for artifact in &self.settings.artifacts {
            scope.acquire(artifact.clone()).map_err(|e| e.to_string())?;
        }
        Ok(())
    }

    async fn run_scenario(
        &mut self,
        scenario: &Scenario,
        passed: &HashMap<String, bool>,
        suite_scope: &ArtifactScope,
        setup_error: Option<&String>,
    ) -> ScenarioReport {
        let span = tracing::info_span!("scenario", name = %scenario.name);
        let started = Instant::now();

        async {
            let mut state = ScenarioState::default();
            let (verdict, steps_run) = match state.start() {
                Ok(()) => match setup_error {
                    Some(error) => (HarnessError::Setup(error.clone()).into_verdict(None), 0),
                    None => self.evaluate(scenario, passed, suite_scope).await,
                },
                Err(e) => (HarnessError::Setup(e.to_string()).into_verdict(None), 0),
            };
            if let Err(e) = state.finish(verdict.clone()) {
                tracing::error!(error = %e, "invalid scenario transition");
            }

            match verdict {
                Verdict::Passed => tracing::info!(steps_run, "scenario passed"),
                Verdict::Skipped(ref reason) => tracing::info!(%reason, "scenario skipped"),
                Verdict::Failed(ref failure) => {
                    tracing::warn!(kind = %failure.kind, message = %failure.message, "scenario failed")
                }
            }

            ScenarioReport {
                name: scenario.name.clone(),
                verdict,
                steps_run,
                duration: started.elapsed(),
            }
        }
        .instrument(span)
        .await
    }

    /// Check prerequisites, then run the steps.
    async fn evaluate(
        &mut self,
        scenario: &Scenario,
        passed: &HashMap<String, bool>,
        suite_scope: &ArtifactScope,
    ) -> (Verdict, usize) {
        if let Some(dep) = scenario
            .after
            .iter()
            .find(|dep| !passed.get(dep.as_str()).copied().unwrap_or(false))
        {
            let reason = SkipReason::PrerequisiteNotPassed {
                scenario: dep.clone(),
            };
            return (HarnessError::MissingCapability(reason).into_verdict(None), 0);
        }

        for capability in &scenario.requires {
            match self.prober.probe(capability, &mut self.locator).await {
                CapabilityStatus::Available => {}
                CapabilityStatus::Absent(detail) => {
                    let reason = SkipReason::CapabilityAbsent {
                        capability: capability.clone(),
                        detail,
                    };
                    return (HarnessError::MissingCapability(reason).into_verdict(None), 0);
                }
                CapabilityStatus::ProbeError(message) => {
                    let err = HarnessError::CapabilityProbe {
                        capability: capability.clone(),
                        message,
                    };
                    return (err.into_verdict(None), 0);
                }
            }
        }

        let mut programs: HashMap<String, PathBuf> = HashMap::new();
        for tool in scenario.tools() {
            match self.locator.locate(tool) {
                Some(path) => {
                    tracing::debug!(tool, path = %path.display(), "located tool");
                    programs.insert(tool.to_string(), path);
                }
                None => {
                    let reason = SkipReason::ToolMissing {
                        tool: tool.to_string(),
                    };
                    return (HarnessError::MissingCapability(reason).into_verdict(None), 0);
                }
            }
        }

        let mut scope = ArtifactScope::new();
        for artifact in &scenario.artifacts {
            if let Err(e) = scope.acquire(artifact.clone()) {
                return (HarnessError::from(e).into_verdict(None), 0);
            }
        }

        let mut failure: Option<Verdict> = None;
        let mut steps_run = 0;
        for (index, step) in scenario.steps.iter().enumerate() {
            let cleanup = step.best_effort || matches!(step.action, StepAction::Remove(_));
            if failure.is_some() && !cleanup {
                tracing::debug!(step = %step.label, "not run after earlier failure");
                continue;
            }

            steps_run += 1;
            let result = self
                .run_step(scenario, step, &programs, &mut scope, suite_scope)
                .instrument(tracing::debug_span!("step", index, label = %step.label))
                .await;
            match result {
                Ok(()) => {}
                Err(error) if cleanup => {
                    tracing::warn!(step = %step.label, %error, "cleanup step failed, ignored");
                }
                Err(error) => {
                    let step_ref = StepRef {
                        index,
                        label: step.label.clone(),
                    };
                    failure = Some(error.into_verdict(Some(step_ref)));
                }
            }
        }

        // Dropping the scope removes the scenario artifacts
        drop(scope);
        (failure.unwrap_or(Verdict::Passed), steps_run)
    }

    async fn run_step(
        &self,
        scenario: &Scenario,
        step: &Step,
        programs: &HashMap<String, PathBuf>,
        scope: &mut ArtifactScope,
        suite_scope: &ArtifactScope,
    ) -> Result<(), HarnessError> {
        let (tool, args) = match &step.action {
            StepAction::Remove(artifact) => {
                let removed = artifact.remove()?;
                tracing::debug!(path = %artifact.path().display(), removed, "removed artifact");
                return Ok(());
            }
            StepAction::Run { tool, args } => (tool, args),
        };

        if let Some(ref produced) = step.produces {
            // Suite artifacts outlive this scenario, so only clear them
            if suite_scope.owns(produced.path()) {
                produced.remove()?;
            } else {
                scope.acquire(produced.clone())?;
            }
        }

        let program = programs
            .get(tool)
            .ok_or_else(|| HarnessError::Setup(format!("tool '{}' was not located", tool)))?;
        let invocation = Invocation::new(program)
            .args(args.iter().cloned())
            .cwd(&self.settings.layout.work_dir)
            .timeout(step.timeout.unwrap_or(self.settings.default_timeout));

        let captured = invocation.captured(&scenario.name, &step.label);
        tracing::debug!(program = %program_name(program), command = %captured.command_line(), "running");
        let result = run_capture(&invocation).await;
        record_result(&self.capture, captured, &result);
        let run = result?;
        tracing::trace!(stdout = %run.stdout, stderr = %run.stderr, "captured output");

        let allow = self.settings.stderr_allow.merged(&step.stderr_allow);
        step.expect.verify(&run, &step.normalize, &allow)
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
