// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

//! Shared helpers: a scratch workspace with shell-script stand-ins for the
//! GDAL command-line utilities.
//!
//! The stand-ins honor the same arguments and print the same values the
//! real tools print for the autotest datasets, so suites written for the
//! real tools run unchanged against them.

#![allow(dead_code)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// `ogrlineref` stand-in: `-create` writes a 9-feature "shapefile" (one line
/// per feature) with companions; queries need the `-r` artifact to exist.
pub const FAKE_OGRLINEREF: &str = r#"
mode=""; ref=""; out=""; line=""; parts=""
while [ $# -gt 0 ]; do
  case "$1" in
    -create|-get_pos|-get_coord|-get_subline) mode="$1" ;;
    -l) shift; line="$1" ;;
    -p) shift; parts="$1" ;;
    -r) shift; ref="$1" ;;
    -o) shift; out="$1" ;;
    -pm|-s|-x|-y|-m|-mb|-me) shift ;;
    -quiet) ;;
    *) echo "FAILURE: unknown option $1" >&2; exit 1 ;;
  esac
  shift
done
case "$mode" in
  -create)
    for f in "$line" "$parts"; do
      [ -f "$f" ] || { echo "ERROR 4: $f: No such file or directory" >&2; exit 1; }
    done
    [ -e "$out" ] && { echo "ERROR 1: $out already exists" >&2; exit 1; }
    i=1
    while [ "$i" -le 9 ]; do echo "part $i" >> "$out"; i=$((i + 1)); done
    touch "${out%.shp}.shx" "${out%.shp}.dbf" "${out%.shp}.prj"
    ;;
  -get_pos|-get_coord|-get_subline)
    [ -f "$ref" ] || { echo "ERROR 4: $ref: No such file or directory" >&2; exit 1; }
    case "$mode" in
      -get_pos) echo "${FAKE_POSITION:-15977.724709}" ;;
      -get_coord) echo "-1.435097,51.950080,0.000000" ;;
      -get_subline) echo "subline" > "$out"; touch "${out%.shp}.shx" "${out%.shp}.dbf" ;;
    esac
    ;;
  *) echo "FAILURE: no mode given" >&2; exit 1 ;;
esac
"#;

/// `ogrinfo` stand-in: reports one feature per line of the last argument.
pub const FAKE_OGRINFO: &str = r#"
for last; do :; done
[ -f "$last" ] || { echo "FAILURE: Unable to open datasource \`$last'" >&2; exit 1; }
echo "INFO: Open of \`$last'"
echo "      using driver \`ESRI Shapefile' successful."
echo ""
echo "Layer name: $(basename "$last" .shp)"
echo "Geometry: Line String"
echo "Feature Count: $(wc -l < "$last" | tr -d ' ')"
"#;

/// `gdalinfo` stand-in with a LAN driver and a band checksum of 10.
pub const FAKE_GDALINFO: &str = r#"
if [ "$1" = "--formats" ]; then
  echo "Supported Formats:"
  echo "  GTiff -raster- (rw+vs): GeoTIFF"
  echo "  LAN -raster- (rv): Erdas .LAN/.GIS"
  exit 0
fi
for last; do :; done
[ -f "$last" ] || { echo "ERROR 4: $last: No such file or directory" >&2; exit 1; }
echo "Driver: LAN/Erdas .LAN/.GIS"
echo "Files: $last"
echo "Size is 7, 1"
echo "Band 1 Block=7x1 Type=Byte, ColorInterp=Undefined"
echo "  Checksum=10"
"#;

pub const FAKE_GEOS_CONFIG: &str = "echo 3.12.1";

/// Input datasets the demo suites read from `{data}`
const DATASETS: &[&str] = &["path.shp", "mstones.shp", "fakelan.lan", "fakelan4bit.lan"];

/// A temporary directory laid out like a suite's work dir:
/// `bin/` for tools and `data/` for input datasets.
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("bin")).unwrap();
        std::fs::create_dir(dir.path().join("data")).unwrap();
        for name in DATASETS {
            std::fs::write(dir.path().join("data").join(name), "fixture\n").unwrap();
        }
        Self { dir }
    }

    /// Workspace with every GDAL stand-in installed in `bin/`
    pub fn with_gdal_fakes() -> Self {
        let ws = Self::new();
        ws.tool("ogrlineref", FAKE_OGRLINEREF);
        ws.tool("ogrinfo", FAKE_OGRINFO);
        ws.tool("gdalinfo", FAKE_GDALINFO);
        ws.tool("geos-config", FAKE_GEOS_CONFIG);
        ws
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn bin(&self) -> PathBuf {
        self.dir.path().join("bin")
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    /// Install an executable `/bin/sh` script in `bin/`
    pub fn tool(&self, name: &str, body: &str) -> PathBuf {
        let path = self.bin().join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    pub fn remove_tool(&self, name: &str) {
        std::fs::remove_file(self.bin().join(name)).unwrap();
    }

    /// Write a suite file at the workspace root
    pub fn write_suite(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    /// Copy a suite from `demos/` to the workspace root
    pub fn demo_suite(&self, name: &str) -> PathBuf {
        let content = std::fs::read_to_string(demo_path(name)).unwrap();
        self.write_suite(name, &content)
    }

    /// Paths under `tmp/` that still exist
    pub fn leftovers(&self) -> Vec<PathBuf> {
        match std::fs::read_dir(self.path("tmp")) {
            Ok(entries) => entries.map(|e| e.unwrap().path()).collect(),
            Err(_) => Vec::new(),
        }
    }
}

pub fn demo_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../demos")
        .join(name)
}
