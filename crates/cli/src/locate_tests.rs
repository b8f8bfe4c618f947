// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![cfg(unix)]
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
use super::*;
use serial_test::serial;
use std::os::unix::fs::PermissionsExt;
use tempfile::TempDir;

fn write_tool(dir: &Path, name: &str, mode: u32) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, "#!/bin/sh\nexit 0\n").unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(mode)).unwrap();
    path
}

#[test]
fn finds_tool_in_search_dir() {
    let dir = TempDir::new().unwrap();
    let tool = write_tool(dir.path(), "ogrlineref", 0o755);

    let mut locator = ToolLocator::new(SearchConfig::new().isolated().with_search_dir(dir.path()));
    assert_eq!(locator.locate("ogrlineref"), Some(tool));
}

#[test]
fn relative_search_dir_yields_absolute_path() {
    let cwd = std::env::current_dir().unwrap();
    let dir = tempfile::tempdir_in(&cwd).unwrap();
    let tool = write_tool(dir.path(), "geos-config", 0o755);
    let relative = dir.path().strip_prefix(&cwd).unwrap().to_path_buf();
    assert!(relative.is_relative());

    let mut locator = ToolLocator::new(SearchConfig::new().isolated().with_search_dir(relative));
    let found = locator.locate("geos-config").unwrap();
    assert!(found.is_absolute());
    assert_eq!(found, tool);
}

#[test]
fn missing_tool_is_absent() {
    let dir = TempDir::new().unwrap();
    let mut locator = ToolLocator::new(SearchConfig::new().isolated().with_search_dir(dir.path()));
    assert_eq!(locator.locate("ogrlineref"), None);
}

#[test]
fn non_executable_file_is_skipped() {
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();
    write_tool(first.path(), "ogrinfo", 0o644);
    let good = write_tool(second.path(), "ogrinfo", 0o755);

    let mut locator = ToolLocator::new(
        SearchConfig::new()
            .isolated()
            .with_search_dir(first.path())
            .with_search_dir(second.path()),
    );
    assert_eq!(locator.locate("ogrinfo"), Some(good));
}

#[test]
fn directory_is_not_a_tool() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir(dir.path().join("ogrinfo")).unwrap();
    assert!(!is_executable(&dir.path().join("ogrinfo")));
}

#[test]
fn explicit_path_wins_over_search_dirs() {
    let search = TempDir::new().unwrap();
    let pinned = TempDir::new().unwrap();
    write_tool(search.path(), "ogrlineref", 0o755);
    let explicit = write_tool(pinned.path(), "ogrlineref-3.9", 0o755);

    let mut locator = ToolLocator::new(
        SearchConfig::new()
            .isolated()
            .with_tool("ogrlineref", &explicit)
            .with_search_dir(search.path()),
    );
    assert_eq!(locator.locate("ogrlineref"), Some(explicit));
}

#[test]
fn stale_explicit_path_falls_back_to_search() {
    let search = TempDir::new().unwrap();
    let found = write_tool(search.path(), "ogrlineref", 0o755);

    let mut locator = ToolLocator::new(
        SearchConfig::new()
            .isolated()
            .with_tool("ogrlineref", "/nonexistent/ogrlineref")
            .with_search_dir(search.path()),
    );
    assert_eq!(locator.locate("ogrlineref"), Some(found));
}

#[test]
fn results_are_memoized() {
    let dir = TempDir::new().unwrap();
    let mut locator = ToolLocator::new(SearchConfig::new().isolated().with_search_dir(dir.path()));
    assert_eq!(locator.locate("late"), None);

    // appearing later does not change the answer for this run
    write_tool(dir.path(), "late", 0o755);
    assert_eq!(locator.locate("late"), None);
}

#[test]
fn path_like_name_is_checked_directly() {
    let dir = TempDir::new().unwrap();
    let tool = write_tool(dir.path(), "gdalinfo", 0o755);
    let mut locator = ToolLocator::new(SearchConfig::new().isolated());
    assert_eq!(locator.locate(tool.to_str().unwrap()), Some(tool.clone()));
}

#[test]
#[serial]
fn environment_override_is_consulted_first() {
    let dir = TempDir::new().unwrap();
    let search = TempDir::new().unwrap();
    let overridden = write_tool(dir.path(), "custom-lineref", 0o755);
    write_tool(search.path(), "ogrlineref", 0o755);

    std::env::set_var("CLICONFORM_TOOL_OGRLINEREF", &overridden);
    let mut locator = ToolLocator::new(SearchConfig::new().with_search_dir(search.path()));
    let found = locator.locate("ogrlineref");
    std::env::remove_var("CLICONFORM_TOOL_OGRLINEREF");

    assert_eq!(found, Some(overridden));
}

#[test]
#[serial]
fn search_path_env_is_consulted() {
    let dir = TempDir::new().unwrap();
    let tool = write_tool(dir.path(), "cliconform-test-only-tool", 0o755);

    std::env::set_var(crate::env::CLICONFORM_SEARCH_PATH, dir.path());
    let mut locator = ToolLocator::new(SearchConfig::new());
    let found = locator.locate("cliconform-test-only-tool");
    std::env::remove_var(crate::env::CLICONFORM_SEARCH_PATH);

    assert_eq!(found, Some(tool));
}
