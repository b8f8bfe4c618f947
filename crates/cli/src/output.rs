// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! User-facing output: diagnostics on stderr, reports and listings on stdout.
//!
//! Diagnostics are colored when stderr is a terminal.

use std::io::{self, IsTerminal, Write};

use crate::cli::OutputFormat;
use crate::report::SuiteReport;
use crate::scenario::ScenarioRegistry;

/// Print an error message to stderr.
///
/// Displays in red when stderr is a terminal, plain text otherwise.
pub fn print_error(msg: impl std::fmt::Display) {
    let is_tty = io::stderr().is_terminal();
    write_error(&mut io::stderr(), msg, is_tty);
}

fn write_error<W: Write>(writer: &mut W, msg: impl std::fmt::Display, is_terminal: bool) {
    if is_terminal {
        let _ = writeln!(writer, "\x1b[31mError: {}\x1b[0m", msg);
    } else {
        let _ = writeln!(writer, "Error: {}", msg);
    }
}

/// Print a warning message to stderr.
///
/// Displays in yellow when stderr is a terminal, plain text otherwise.
pub fn print_warning(msg: impl std::fmt::Display) {
    let is_tty = io::stderr().is_terminal();
    write_warning(&mut io::stderr(), msg, is_tty);
}

fn write_warning<W: Write>(writer: &mut W, msg: impl std::fmt::Display, is_terminal: bool) {
    if is_terminal {
        let _ = writeln!(writer, "\x1b[33mWarning: {}\x1b[0m", msg);
    } else {
        let _ = writeln!(writer, "Warning: {}", msg);
    }
}

/// Render a suite report in the requested format
pub fn render_report(report: &SuiteReport, format: OutputFormat) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Text => Ok(report.to_text()),
        OutputFormat::Json => report.to_json().map(|mut json| {
            json.push('\n');
            json
        }),
    }
}

/// One scenario per line, with its prerequisites
pub fn render_listing(registry: &ScenarioRegistry) -> String {
    let mut out = String::new();
    for scenario in registry.iter() {
        out.push_str(&scenario.name);
        if !scenario.requires.is_empty() {
            out.push_str(&format!("  requires: {}", scenario.requires.join(", ")));
        }
        if !scenario.after.is_empty() {
            out.push_str(&format!("  after: {}", scenario.after.join(", ")));
        }
        if let Some(ref description) = scenario.description {
            out.push_str(&format!("  # {}", description));
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
