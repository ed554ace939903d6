//! Test fixtures shared by the integration tests
//!
//! - A share directory with two platform flow definitions
//! - A project flow configuration overriding both platforms

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Share directory containing `platforms/*.json`
pub fn share_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/share")
}

/// The checked-in project flow configuration
pub fn project_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/project/flow.json")
}

/// Copy the project fixture into a fresh temp dir so tests can mutate it.
pub fn scratch_project() -> (TempDir, PathBuf) {
    let temp = TempDir::new().expect("create temp dir");
    let path = temp.path().join("flow.json");
    fs::copy(project_path(), &path).expect("copy project fixture");
    (temp, path)
}
