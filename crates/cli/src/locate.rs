// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Resolving tool names to executable paths.
//!
//! Search order for a tool:
//! 1. `CLICONFORM_TOOL_<NAME>` environment override
//! 2. explicit `path` from the suite's `[tools.<name>]` table
//! 3. `--search-path` directories, then the suite's `search_paths`
//! 4. `CLICONFORM_SEARCH_PATH`
//! 5. `PATH`
//!
//! An override or explicit path that is not executable is reported and the
//! search continues, so a stale override degrades to the normal lookup.

use crate::env;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// Where to look for tools
#[derive(Clone, Debug, Default)]
pub struct SearchConfig {
    /// Explicit per-tool paths
    pub explicit: BTreeMap<String, PathBuf>,
    /// Directories searched before the environment
    pub search_dirs: Vec<PathBuf>,
    /// Whether `CLICONFORM_TOOL_*`, `CLICONFORM_SEARCH_PATH` and `PATH` are consulted
    pub use_environment: bool,
}

impl SearchConfig {
    pub fn new() -> Self {
        Self {
            use_environment: true,
            ..Default::default()
        }
    }

    pub fn with_tool(mut self, name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.explicit.insert(name.into(), path.into());
        self
    }

    pub fn with_search_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.search_dirs.push(dir.into());
        self
    }

    /// Restrict the search to explicit paths and search dirs.
    pub fn isolated(mut self) -> Self {
        self.use_environment = false;
        self
    }
}

/// Memoizing tool locator
#[derive(Debug)]
pub struct ToolLocator {
    config: SearchConfig,
    cache: HashMap<String, Option<PathBuf>>,
}

impl ToolLocator {
    pub fn new(config: SearchConfig) -> Self {
        Self {
            config,
            cache: HashMap::new(),
        }
    }

    /// Resolve a tool to an executable path, or `None` if it cannot be found.
    pub fn locate(&mut self, name: &str) -> Option<PathBuf> {
        if let Some(hit) = self.cache.get(name) {
            return hit.clone();
        }
        // Steps run in the work dir, so a relative hit must not stay relative
        let found = self
            .search(name)
            .map(|path| std::path::absolute(&path).unwrap_or(path));
        match &found {
            Some(path) => tracing::debug!(tool = name, path = %path.display(), "tool located"),
            None => tracing::info!(tool = name, "tool not found"),
        }
        self.cache.insert(name.to_string(), found.clone());
        found
    }

    fn search(&self, name: &str) -> Option<PathBuf> {
        if self.config.use_environment {
            if let Some(path) = env::tool_override(name) {
                if is_executable(&path) {
                    return Some(path);
                }
                tracing::warn!(
                    tool = name,
                    variable = %env::tool_override_name(name),
                    path = %path.display(),
                    "tool override is not an executable file; continuing search"
                );
            }
        }

        if let Some(path) = self.config.explicit.get(name) {
            if is_executable(path) {
                return Some(path.clone());
            }
            tracing::warn!(
                tool = name,
                path = %path.display(),
                "configured tool path is not an executable file; continuing search"
            );
        }

        // A name with a directory component is a path, not a search key
        if Path::new(name).components().count() > 1 {
            let path = PathBuf::from(name);
            return is_executable(&path).then_some(path);
        }

        let env_dirs = if self.config.use_environment {
            let mut dirs = env::search_path();
            dirs.extend(env::path_dirs());
            dirs
        } else {
            Vec::new()
        };

        self.config
            .search_dirs
            .iter()
            .chain(env_dirs.iter())
            .flat_map(|dir| candidates(dir, name))
            .find(|candidate| is_executable(candidate))
    }
}

fn candidates(dir: &Path, name: &str) -> Vec<PathBuf> {
    let mut out = vec![dir.join(name)];
    if cfg!(windows) && Path::new(name).extension().is_none() {
        out.push(dir.join(format!("{}.exe", name)));
    }
    out
}

/// A regular file with an execute bit (any file on non-unix platforms).
pub fn is_executable(path: &Path) -> bool {
    let Ok(meta) = std::fs::metadata(path) else {
        return false;
    };
    if !meta.is_file() {
        return false;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        meta.permissions().mode() & 0o111 != 0
    }
    #[cfg(not(unix))]
    {
        true
    }
}

#[cfg(test)]
#[path = "locate_tests.rs"]
mod tests;
