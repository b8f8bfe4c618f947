// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Scenario artifacts and their scoped cleanup.
//!
//! An artifact is a path a step produces and later steps read. Datasets are
//! often several files sharing a stem (`parts.shp`, `parts.shx`,
//! `parts.dbf`), so removal covers declared companion extensions too.
//! `ArtifactGuard` clears stale copies on acquisition and removes the
//! artifact again when dropped, on every exit path.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to remove stale artifact {}: {source}", .path.display())]
    Remove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid companion pattern for {}: {message}", .path.display())]
    Pattern { path: PathBuf, message: String },
}

/// A filesystem artifact with optional companion files
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Artifact {
    path: PathBuf,
    companions: Vec<String>,
}

impl Artifact {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            companions: Vec::new(),
        }
    }

    /// Add companion extensions (`"shx"`), or `"*"` for every file sharing
    /// the primary path's stem.
    pub fn with_companions<I, S>(mut self, companions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.companions
            .extend(companions.into_iter().map(Into::into));
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn companions(&self) -> &[String] {
        &self.companions
    }

    /// True if the primary path exists
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Every path that belongs to this artifact and currently exists.
    pub fn existing_paths(&self) -> Result<Vec<PathBuf>, ArtifactError> {
        let mut paths = Vec::new();
        if self.path.symlink_metadata().is_ok() {
            paths.push(self.path.clone());
        }
        for companion in &self.companions {
            for path in self.companion_paths(companion)? {
                if path != self.path && !paths.contains(&path) && path.symlink_metadata().is_ok() {
                    paths.push(path);
                }
            }
        }
        Ok(paths)
    }

    fn companion_paths(&self, companion: &str) -> Result<Vec<PathBuf>, ArtifactError> {
        if companion != "*" {
            return Ok(vec![self.path.with_extension(companion)]);
        }
        let (Some(parent), Some(stem)) = (self.path.parent(), self.path.file_stem()) else {
            return Ok(Vec::new());
        };
        let parent = if parent.as_os_str().is_empty() {
            Path::new(".")
        } else {
            parent
        };
        let pattern = format!(
            "{}/{}.*",
            glob::Pattern::escape(&parent.to_string_lossy()),
            glob::Pattern::escape(&stem.to_string_lossy())
        );
        let entries = glob::glob(&pattern).map_err(|e| ArtifactError::Pattern {
            path: self.path.clone(),
            message: e.to_string(),
        })?;
        // Unreadable entries are skipped; they cannot be removed either
        Ok(entries.filter_map(Result::ok).collect())
    }

    /// Remove the artifact and its companions.
    ///
    /// A missing artifact is not an error, so removal is idempotent.
    /// Returns the number of paths removed.
    pub fn remove(&self) -> Result<usize, ArtifactError> {
        let mut removed = 0;
        for path in self.existing_paths()? {
            match remove_path(&path) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(source) => return Err(ArtifactError::Remove { path, source }),
            }
        }
        Ok(removed)
    }

    /// Remove the artifact, logging and swallowing any failure.
    pub fn remove_best_effort(&self) {
        match self.remove() {
            Ok(0) => {}
            Ok(n) => tracing::debug!(artifact = %self.path.display(), removed = n, "artifact removed"),
            Err(e) => tracing::warn!(artifact = %self.path.display(), error = %e, "artifact cleanup failed"),
        }
    }
}

fn remove_path(path: &Path) -> io::Result<()> {
    let meta = path.symlink_metadata()?;
    if meta.is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    }
}

/// Owns an artifact for the lifetime of a scope
#[derive(Debug)]
pub struct ArtifactGuard {
    artifact: Artifact,
}

impl ArtifactGuard {
    /// Clear any stale copy of the artifact and take ownership of its cleanup.
    pub fn acquire(artifact: Artifact) -> Result<Self, ArtifactError> {
        artifact.remove()?;
        Ok(Self { artifact })
    }

    pub fn artifact(&self) -> &Artifact {
        &self.artifact
    }
}

impl Drop for ArtifactGuard {
    fn drop(&mut self) {
        self.artifact.remove_best_effort();
    }
}

/// Run `body` with the artifact cleared beforehand and removed afterwards,
/// whatever `body` returns.
pub fn with_artifact<T>(
    artifact: Artifact,
    body: impl FnOnce(&Artifact) -> T,
) -> Result<T, ArtifactError> {
    let guard = ArtifactGuard::acquire(artifact)?;
    Ok(body(guard.artifact()))
}

/// Guards released together, in reverse acquisition order
#[derive(Debug, Default)]
pub struct ArtifactScope {
    guards: Vec<ArtifactGuard>,
}

impl ArtifactScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire an artifact into this scope. Acquiring a path the scope
    /// already owns only clears the stale copy.
    pub fn acquire(&mut self, artifact: Artifact) -> Result<(), ArtifactError> {
        if self.owns(artifact.path()) {
            return artifact.remove().map(|_| ());
        }
        self.guards.push(ArtifactGuard::acquire(artifact)?);
        Ok(())
    }

    pub fn owns(&self, path: &Path) -> bool {
        self.guards.iter().any(|g| g.artifact().path() == path)
    }

    pub fn len(&self) -> usize {
        self.guards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }
}

impl Drop for ArtifactScope {
    fn drop(&mut self) {
        while let Some(guard) = self.guards.pop() {
            drop(guard);
        }
    }
}

#[cfg(test)]
#[path = "artifact_tests.rs"]
mod tests;
