#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use ad_sales::data::RawRecord;
use ad_sales::io_utils;
use encoding_rs::UTF_8;
use tempfile::{TempDir, tempdir};

/// Returns the absolute path to a fixture under `tests/data`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

/// Raw records of the bundled sample export.
pub fn sample_records() -> Vec<RawRecord> {
    io_utils::load_raw_records(&fixture_path("ad_sales_sample.csv"), b',', UTF_8)
        .expect("load sample dataset")
}

/// The messy single-row request used across scenarios.
pub fn scenario_record() -> RawRecord {
    RawRecord::new()
        .with_text("Campaign_Name", "Data Analytcis Course")
        .with_text("Device", "DESKTOP")
        .with_text("Location", "hydrebad")
        .with_text("Cost", "$200")
        .with_text("Ad_Date", "2025-07-24")
}

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }
}
