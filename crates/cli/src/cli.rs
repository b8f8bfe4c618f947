// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Command-line arguments.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::env;

/// Run conformance suites against external command-line tools
#[derive(Parser, Debug, Clone)]
#[command(name = "cliconform", version, about)]
pub struct Cli {
    /// Suite file (TOML, or JSON by extension)
    #[arg(value_name = "SUITE")]
    pub suite: PathBuf,

    /// Directory steps run in (default: the suite file's directory)
    #[arg(long, value_name = "DIR", env = env::CLICONFORM_WORK_DIR)]
    pub work_dir: Option<PathBuf>,

    /// Default per-step timeout, overriding the suite's
    #[arg(long, value_name = "MS", env = env::CLICONFORM_TIMEOUT_MS,
          value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout_ms: Option<u64>,

    /// Extra tool directory, searched before the suite's (repeatable)
    #[arg(long = "search-path", value_name = "DIR")]
    pub search_paths: Vec<PathBuf>,

    /// Run only scenarios whose name contains this text
    #[arg(long, value_name = "SUBSTRING")]
    pub filter: Option<String>,

    /// Append every invocation to this JSONL file
    #[arg(long, value_name = "FILE")]
    pub capture: Option<PathBuf>,

    /// Report format
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Print scenario names and exit
    #[arg(long)]
    pub list: bool,

    /// Debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// One line per scenario plus failure details
    #[default]
    Text,
    /// The full report as JSON
    Json,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
