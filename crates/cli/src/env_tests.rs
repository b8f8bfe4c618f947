// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
use super::*;
use serial_test::serial;

#[test]
#[serial]
fn search_path_empty_when_unset() {
    std::env::remove_var(CLICONFORM_SEARCH_PATH);
    assert!(search_path().is_empty());
}

#[test]
#[serial]
fn search_path_splits_entries() {
    let joined = std::env::join_paths(["/opt/gdal/bin", "/usr/local/bin"]).unwrap();
    std::env::set_var(CLICONFORM_SEARCH_PATH, &joined);
    let result = search_path();
    std::env::remove_var(CLICONFORM_SEARCH_PATH);
    assert_eq!(
        result,
        vec![PathBuf::from("/opt/gdal/bin"), PathBuf::from("/usr/local/bin")]
    );
}

#[test]
fn tool_override_name_sanitizes() {
    assert_eq!(tool_override_name("ogrlineref"), "CLICONFORM_TOOL_OGRLINEREF");
    assert_eq!(tool_override_name("gdal-info"), "CLICONFORM_TOOL_GDAL_INFO");
    assert_eq!(tool_override_name("a.b"), "CLICONFORM_TOOL_A_B");
}

#[test]
#[serial]
fn tool_override_reads_sanitized_name() {
    std::env::set_var("CLICONFORM_TOOL_GDAL_INFO", "/opt/bin/gdalinfo");
    let result = tool_override("gdal-info");
    std::env::remove_var("CLICONFORM_TOOL_GDAL_INFO");
    assert_eq!(result, Some(PathBuf::from("/opt/bin/gdalinfo")));
}
