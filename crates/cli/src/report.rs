// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Suite results and their text and JSON renderings.

use crate::verdict::{Failure, Verdict};
use chrono::{DateTime, Utc};
use serde::Serialize;
use similar::TextDiff;
use std::collections::BTreeMap;
use std::time::Duration;
use uuid::Uuid;

/// Outcome of one scenario
#[derive(Clone, Debug, Serialize)]
pub struct ScenarioReport {
    pub name: String,
    #[serde(flatten)]
    pub verdict: Verdict,
    /// Steps that actually executed
    pub steps_run: usize,
    #[serde(rename = "duration_ms", serialize_with = "serialize_millis")]
    pub duration: Duration,
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

/// Outcome of a suite run
#[derive(Clone, Debug, Serialize)]
pub struct SuiteReport {
    pub suite: String,
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub scenarios: Vec<ScenarioReport>,
}

impl SuiteReport {
    pub fn new(suite: impl Into<String>) -> Self {
        Self {
            suite: suite.into(),
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            scenarios: Vec::new(),
        }
    }

    pub fn push(&mut self, scenario: ScenarioReport) {
        self.scenarios.push(scenario);
    }

    pub fn get(&self, name: &str) -> Option<&ScenarioReport> {
        self.scenarios.iter().find(|s| s.name == name)
    }

    /// Count scenarios by verdict label ("pass", "fail", "skip")
    pub fn counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::from([("pass", 0), ("fail", 0), ("skip", 0)]);
        for scenario in &self.scenarios {
            *counts.entry(scenario.verdict.label()).or_insert(0) += 1;
        }
        counts
    }

    pub fn passed(&self) -> usize {
        self.scenarios.iter().filter(|s| s.verdict.is_passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.scenarios.iter().filter(|s| s.verdict.is_failed()).count()
    }

    pub fn skipped(&self) -> usize {
        self.scenarios.iter().filter(|s| s.verdict.is_skipped()).count()
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    /// Human-readable summary
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("suite {} ({})\n", self.suite, self.run_id));

        for scenario in &self.scenarios {
            out.push_str(&format!(
                "{} {} ({}ms)\n",
                scenario.verdict.label().to_uppercase(),
                scenario.name,
                scenario.duration.as_millis()
            ));
            match &scenario.verdict {
                Verdict::Passed => {}
                Verdict::Skipped(reason) => out.push_str(&format!("    {}\n", reason)),
                Verdict::Failed(failure) => write_failure(&mut out, failure),
            }
        }

        out.push_str(&format!(
            "\n{} passed, {} failed, {} skipped\n",
            self.passed(),
            self.failed(),
            self.skipped()
        ));
        out
    }

    /// JSON document for `--format json`
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn write_failure(out: &mut String, failure: &Failure) {
    match failure.step {
        Some(ref step) => out.push_str(&format!(
            "    step {} ({}): {}\n",
            step.index + 1,
            step.label,
            failure.kind
        )),
        None => out.push_str(&format!("    {}\n", failure.kind)),
    }
    out.push_str(&format!("    {}\n", failure.message));

    match (&failure.actual, &failure.expected) {
        (Some(actual), Some(expected)) if actual.contains('\n') || expected.contains('\n') => {
            let diff = TextDiff::from_lines(expected.as_str(), actual.as_str());
            for line in diff
                .unified_diff()
                .context_radius(3)
                .header("expected", "actual")
                .to_string()
                .lines()
            {
                out.push_str(&format!("    {}\n", line));
            }
        }
        (actual, expected) => {
            if let Some(expected) = expected {
                out.push_str(&format!("    expected: {:?}\n", expected));
            }
            if let Some(actual) = actual {
                out.push_str(&format!("    actual:   {:?}\n", actual));
            }
        }
    }
}

#[cfg(test)]
#[path = "report_tests.rs"]
mod tests;
