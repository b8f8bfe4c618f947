// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Output normalization applied before captured output is compared.
//!
//! External tools print trailing newlines, CRLF line endings on some
//! platforms, and occasionally color codes. Rules are compiled once when the
//! suite loads and run in declaration order; comparison itself always trims,
//! so most suites need no rules at all.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Static regex for matching ANSI escape sequences
static ANSI_REGEX: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\x1b\[[0-9;?]*[a-zA-Z]").ok());

static WHITESPACE_RUN: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"[ \t]+").ok());

/// Normalization rule for deterministic comparison
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NormalizationRule {
    /// Replace matching pattern with fixed string
    Replace {
        pattern: String,
        replacement: String,
        #[serde(default)]
        flags: Option<String>,
    },
    /// Remove lines matching pattern
    RemoveLines { pattern: String },
    /// Strip ANSI escape codes
    StripAnsi,
    /// Convert `\r\n` and lone `\r` to `\n`
    NormalizeLineEndings,
    /// Collapse runs of spaces and tabs to a single space
    CollapseWhitespace,
    /// Trim leading and trailing whitespace
    Trim,
}

impl NormalizationRule {
    /// Compile the rule's pattern, if any.
    pub fn compile(&self) -> Result<Normalizer, regex::Error> {
        Ok(match self {
            NormalizationRule::Replace {
                pattern,
                replacement,
                flags,
            } => Normalizer::Replace {
                regex: build_regex(pattern, flags.as_deref())?,
                replacement: replacement.clone(),
            },
            NormalizationRule::RemoveLines { pattern } => {
                Normalizer::RemoveLines(Regex::new(pattern)?)
            }
            NormalizationRule::StripAnsi => Normalizer::StripAnsi,
            NormalizationRule::NormalizeLineEndings => Normalizer::NormalizeLineEndings,
            NormalizationRule::CollapseWhitespace => Normalizer::CollapseWhitespace,
            NormalizationRule::Trim => Normalizer::Trim,
        })
    }
}

/// A normalization rule with its pattern compiled
#[derive(Clone, Debug)]
pub enum Normalizer {
    Replace { regex: Regex, replacement: String },
    RemoveLines(Regex),
    StripAnsi,
    NormalizeLineEndings,
    CollapseWhitespace,
    Trim,
}

impl Normalizer {
    /// Apply this rule to input text
    pub fn apply(&self, input: &str) -> String {
        match self {
            Normalizer::Replace { regex, replacement } => {
                regex.replace_all(input, replacement.as_str()).into_owned()
            }
            Normalizer::RemoveLines(regex) => input
                .lines()
                .filter(|line| !regex.is_match(line))
                .collect::<Vec<_>>()
                .join("\n"),
            Normalizer::StripAnsi => match ANSI_REGEX.as_ref() {
                Some(re) => re.replace_all(input, "").into_owned(),
                None => input.to_string(),
            },
            Normalizer::NormalizeLineEndings => input.replace("\r\n", "\n").replace('\r', "\n"),
            Normalizer::CollapseWhitespace => match WHITESPACE_RUN.as_ref() {
                Some(re) => re.replace_all(input, " ").into_owned(),
                None => input.to_string(),
            },
            Normalizer::Trim => input.trim().to_string(),
        }
    }
}

/// Compile every rule, failing on the first bad pattern.
pub fn compile_rules(rules: &[NormalizationRule]) -> Result<Vec<Normalizer>, regex::Error> {
    rules.iter().map(NormalizationRule::compile).collect()
}

fn build_regex(pattern: &str, flags: Option<&str>) -> Result<Regex, regex::Error> {
    let flags = flags.unwrap_or_default();
    regex::RegexBuilder::new(pattern)
        .case_insensitive(flags.contains('i'))
        .multi_line(flags.contains('m'))
        .build()
}

/// Apply compiled rules in order.
pub fn normalize(input: &str, rules: &[Normalizer]) -> String {
    rules
        .iter()
        .fold(input.to_string(), |acc, rule| rule.apply(&acc))
}

#[cfg(test)]
#[path = "normalize_tests.rs"]
mod tests;
