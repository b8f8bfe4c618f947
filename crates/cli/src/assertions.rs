// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Comparators for captured process output.
//!
//! Every mismatch carries the literal actual and expected values so the
//! report can print them side by side.

use crate::process::{describe_code, CapturedRun, ProcessError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Captured output did not match an expectation
#[derive(Clone, Debug, Error, PartialEq)]
#[error("{what}: expected {expected:?}, got {actual:?}")]
pub struct AssertionMismatch {
    /// Which check failed, e.g. "stdout" or "feature count"
    pub what: String,
    pub actual: String,
    pub expected: String,
}

impl AssertionMismatch {
    pub fn new(what: impl Into<String>, actual: impl Into<String>, expected: impl Into<String>) -> Self {
        Self {
            what: what.into(),
            actual: actual.into(),
            expected: expected.into(),
        }
    }
}

/// Compare whitespace-trimmed output against an exact literal.
pub fn assert_exact_output(actual: &str, expected: &str) -> Result<(), AssertionMismatch> {
    let actual = actual.trim();
    let expected = expected.trim();
    if actual == expected {
        Ok(())
    } else {
        Err(AssertionMismatch::new("stdout", actual, expected))
    }
}

/// Compare output numerically: passes when `|actual - expected| <= tolerance`.
///
/// Both sides are trimmed and parsed as `f64`. Unparseable or non-finite
/// values on either side are a mismatch, never a pass.
pub fn assert_numeric_output(
    actual: &str,
    expected: &str,
    tolerance: f64,
) -> Result<(), AssertionMismatch> {
    numeric_check("stdout", actual, expected, tolerance)
}

fn numeric_check(
    what: &str,
    actual: &str,
    expected: &str,
    tolerance: f64,
) -> Result<(), AssertionMismatch> {
    let actual_text = actual.trim();
    let expected_text = expected.trim();
    let mismatch = || AssertionMismatch::new(what, actual_text, expected_text);

    let expected_value: f64 = expected_text.parse().map_err(|_| mismatch())?;
    let actual_value: f64 = actual_text.parse().map_err(|_| mismatch())?;
    if !actual_value.is_finite()
        || !expected_value.is_finite()
        || (actual_value - expected_value).abs() > tolerance
    {
        return Err(mismatch());
    }
    Ok(())
}

/// Regexes that stderr lines may match without failing a step
#[derive(Clone, Debug, Default)]
pub struct StderrAllowList {
    patterns: Vec<Regex>,
}

impl StderrAllowList {
    pub fn new(patterns: &[String]) -> Result<Self, regex::Error> {
        let patterns = patterns
            .iter()
            .map(|p| Regex::new(p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// Combine two lists; a line allowed by either is allowed.
    pub fn merged(&self, other: &StderrAllowList) -> StderrAllowList {
        let mut patterns = self.patterns.clone();
        patterns.extend(other.patterns.iter().cloned());
        StderrAllowList { patterns }
    }

    pub fn allows(&self, line: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(line))
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Fail when stderr carries any line the allow-list does not cover.
pub fn assert_no_stderr(stderr: &str, allow: &StderrAllowList) -> Result<(), ProcessError> {
    let unexpected: Vec<&str> = stderr
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter(|line| !allow.allows(line))
        .collect();
    if unexpected.is_empty() {
        Ok(())
    } else {
        Err(ProcessError::UnexpectedStderr {
            stderr: unexpected.join("\n"),
        })
    }
}

/// Expected exit condition
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ExitExpectation {
    /// A specific exit code
    Code(i32),
    Keyword(ExitKeyword),
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExitKeyword {
    /// Exit code 0
    Success,
    /// Any non-zero exit code (signal termination does not count)
    Nonzero,
    /// Exit status is not checked
    Any,
}

impl Default for ExitExpectation {
    fn default() -> Self {
        ExitExpectation::Code(0)
    }
}

impl ExitExpectation {
    pub fn matches(&self, code: Option<i32>) -> bool {
        match self {
            ExitExpectation::Code(expected) => code == Some(*expected),
            ExitExpectation::Keyword(ExitKeyword::Success) => code == Some(0),
            ExitExpectation::Keyword(ExitKeyword::Nonzero) => code.is_some_and(|c| c != 0),
            ExitExpectation::Keyword(ExitKeyword::Any) => true,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            ExitExpectation::Code(c) => describe_code(Some(*c)),
            ExitExpectation::Keyword(ExitKeyword::Success) => describe_code(Some(0)),
            ExitExpectation::Keyword(ExitKeyword::Nonzero) => "a non-zero exit code".to_string(),
            ExitExpectation::Keyword(ExitKeyword::Any) => "any exit status".to_string(),
        }
    }

    pub fn check(&self, run: &CapturedRun) -> Result<(), ProcessError> {
        if self.matches(run.exit_code) {
            Ok(())
        } else {
            Err(ProcessError::UnexpectedExit {
                expected: self.describe(),
                actual: run.exit_code,
                stderr: run.stderr.clone(),
            })
        }
    }
}

/// How stderr is treated
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StderrExpectation {
    /// Non-empty stderr fails the step unless allow-listed
    #[default]
    Empty,
    /// Stderr is not inspected
    Ignore,
}

/// Stdout expectation as written in a suite file
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputSpec {
    /// Trimmed output equals the text
    Exact { text: String },
    /// Trimmed output parses as a number within tolerance of the value
    Numeric {
        value: String,
        #[serde(default)]
        tolerance: f64,
    },
    /// Output contains the text
    Contains { text: String },
    /// Output matches the regex somewhere
    Regex { pattern: String },
    /// A capture group of the regex equals a value (numerically if a
    /// tolerance is given)
    RegexCapture {
        pattern: String,
        #[serde(default = "default_group")]
        group: usize,
        equals: String,
        #[serde(default)]
        tolerance: Option<f64>,
        /// Label used in diagnostics, e.g. "feature count"
        #[serde(default)]
        label: Option<String>,
    },
    /// Trimmed output is empty
    Empty,
}

fn default_group() -> usize {
    1
}

#[derive(Debug, Error, PartialEq)]
pub enum OutputSpecError {
    #[error("invalid regex pattern '{pattern}': {error}")]
    InvalidRegex { pattern: String, error: String },

    #[error("'{value}' is not a finite number")]
    NotANumber { value: String },

    #[error("tolerance must be finite and non-negative, got {0}")]
    InvalidTolerance(f64),

    #[error("pattern '{pattern}' has no capture group {group}")]
    MissingGroup { pattern: String, group: usize },
}

/// Stdout expectation with patterns compiled
#[derive(Clone, Debug)]
pub enum OutputCheck {
    Exact(String),
    Numeric { value: String, tolerance: f64 },
    Contains(String),
    Regex(Regex),
    RegexCapture {
        regex: Regex,
        group: usize,
        equals: String,
        tolerance: Option<f64>,
        label: String,
    },
    Empty,
}

impl OutputSpec {
    pub fn compile(&self) -> Result<OutputCheck, OutputSpecError> {
        let compile_regex = |pattern: &str| {
            Regex::new(pattern).map_err(|e| OutputSpecError::InvalidRegex {
                pattern: pattern.to_string(),
                error: e.to_string(),
            })
        };
        let check_tolerance = |t: f64| {
            if t.is_finite() && t >= 0.0 {
                Ok(t)
            } else {
                Err(OutputSpecError::InvalidTolerance(t))
            }
        };
        let check_number = |v: &str| match v.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => Ok(()),
            _ => Err(OutputSpecError::NotANumber {
                value: v.to_string(),
            }),
        };

        Ok(match self {
            OutputSpec::Exact { text } => OutputCheck::Exact(text.clone()),
            OutputSpec::Numeric { value, tolerance } => {
                check_number(value)?;
                OutputCheck::Numeric {
                    value: value.clone(),
                    tolerance: check_tolerance(*tolerance)?,
                }
            }
            OutputSpec::Contains { text } => OutputCheck::Contains(text.clone()),
            OutputSpec::Regex { pattern } => OutputCheck::Regex(compile_regex(pattern)?),
            OutputSpec::RegexCapture {
                pattern,
                group,
                equals,
                tolerance,
                label,
            } => {
                let regex = compile_regex(pattern)?;
                if *group >= regex.captures_len() {
                    return Err(OutputSpecError::MissingGroup {
                        pattern: pattern.clone(),
                        group: *group,
                    });
                }
                if let Some(t) = tolerance {
                    check_tolerance(*t)?;
                    check_number(equals)?;
                }
                OutputCheck::RegexCapture {
                    regex,
                    group: *group,
                    equals: equals.clone(),
                    tolerance: *tolerance,
                    label: label.clone().unwrap_or_else(|| "captured value".to_string()),
                }
            }
            OutputSpec::Empty => OutputCheck::Empty,
        })
    }
}

impl OutputCheck {
    /// Check already-normalized stdout.
    pub fn check(&self, actual: &str) -> Result<(), AssertionMismatch> {
        match self {
            OutputCheck::Exact(expected) => assert_exact_output(actual, expected),
            OutputCheck::Numeric { value, tolerance } => {
                assert_numeric_output(actual, value, *tolerance)
            }
            OutputCheck::Contains(text) => {
                if actual.contains(text.as_str()) {
                    Ok(())
                } else {
                    Err(AssertionMismatch::new(
                        "stdout (contains)",
                        actual.trim(),
                        text.as_str(),
                    ))
                }
            }
            OutputCheck::Regex(re) => {
                if re.is_match(actual) {
                    Ok(())
                } else {
                    Err(AssertionMismatch::new(
                        "stdout (regex)",
                        actual.trim(),
                        re.as_str(),
                    ))
                }
            }
            OutputCheck::RegexCapture {
                regex,
                group,
                equals,
                tolerance,
                label,
            } => {
                let Some(captured) = regex
                    .captures(actual)
                    .and_then(|caps| caps.get(*group))
                    .map(|m| m.as_str())
                else {
                    return Err(AssertionMismatch::new(
                        label.as_str(),
                        format!("no match for /{}/ in {:?}", regex.as_str(), actual.trim()),
                        equals.as_str(),
                    ));
                };
                match tolerance {
                    Some(t) => numeric_check(label, captured, equals, *t),
                    None if captured.trim() == equals.trim() => Ok(()),
                    None => Err(AssertionMismatch::new(
                        label.as_str(),
                        captured.trim(),
                        equals.trim(),
                    )),
                }
            }
            OutputCheck::Empty => {
                if actual.trim().is_empty() {
                    Ok(())
                } else {
                    Err(AssertionMismatch::new("stdout", actual.trim(), ""))
                }
            }
        }
    }
}

/// Post-condition: the listed paths exist after the step
pub fn assert_paths_exist(paths: &[PathBuf]) -> Result<(), AssertionMismatch> {
    match paths.iter().find(|p| !p.exists()) {
        None => Ok(()),
        Some(missing) => Err(AssertionMismatch::new(
            "artifact",
            format!("{} is missing", missing.display()),
            format!("{} exists", missing.display()),
        )),
    }
}

#[cfg(test)]
#[path = "assertions_tests.rs"]
mod tests;
