// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access.
//!
//! All runtime environment variables read by cliconform are defined here.
//! `CLICONFORM_TIMEOUT_MS` and `CLICONFORM_WORK_DIR` are read by clap.
//! Use these accessors instead of calling `std::env::var()` directly.

/// Generated env var name constants.
mod names {
    include!(concat!(env!("OUT_DIR"), "/env_names.rs"));
}

pub use names::*;

use std::path::PathBuf;

/// `CLICONFORM_SEARCH_PATH`: Extra tool directories, `PATH`-style separated.
pub fn search_path() -> Vec<PathBuf> {
    split_var(names::CLICONFORM_SEARCH_PATH)
}

/// `CLICONFORM_TOOL_<NAME>`: Explicit path for one tool.
///
/// The tool name is upper-cased and every character outside `[A-Z0-9]`
/// becomes `_`, so `gdal-info` reads `CLICONFORM_TOOL_GDAL_INFO`.
pub fn tool_override(tool: &str) -> Option<PathBuf> {
    std::env::var(tool_override_name(tool))
        .ok()
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Name of the override variable for a tool.
pub fn tool_override_name(tool: &str) -> String {
    let suffix: String = tool
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("{}{}", names::CLICONFORM_TOOL_PREFIX, suffix)
}

/// A variable a suite names for an `env` capability probe.
///
/// Unset and non-unicode values both read as `None`.
pub fn capability_var(var: &str) -> Option<String> {
    std::env::var(var).ok()
}

/// `PATH`: System executable search path.
pub fn path_dirs() -> Vec<PathBuf> {
    split_var(names::PATH)
}

fn split_var(name: &str) -> Vec<PathBuf> {
    std::env::var_os(name)
        .map(|v| {
            std::env::split_paths(&v)
                .filter(|p| !p.as_os_str().is_empty())
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
