//! Locating optional real survey files.
//!
//! Files are searched for in `$TEST_DATA_DIR` first, then in the
//! `testdata/` directories of the crates that read survey data, then in
//! `testdata/` at the workspace root.

use std::path::{Path, PathBuf};

/// Crates whose `testdata/` directories hold survey files.
const DATA_CRATES: [&str; 2] = ["netcdf-reader", "line-processor"];

/// Nearest ancestor of this crate whose `Cargo.toml` declares a workspace.
pub fn workspace_root() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .ancestors()
        .skip(1)
        .find(|dir| {
            std::fs::read_to_string(dir.join("Cargo.toml"))
                .map(|manifest| manifest.contains("[workspace]"))
                .unwrap_or(false)
        })
        .unwrap_or(manifest_dir)
        .to_path_buf()
}

/// Directories searched for survey files, in priority order.
pub fn survey_data_dirs() -> Vec<PathBuf> {
    let root = workspace_root();
    std::env::var_os("TEST_DATA_DIR")
        .map(PathBuf::from)
        .into_iter()
        .chain(DATA_CRATES.iter().map(|name| root.join("crates").join(name).join("testdata")))
        .chain(std::iter::once(root.join("testdata")))
        .collect()
}

/// First existing `name` in the survey data directories.
pub fn find_test_file(name: &str) -> Option<PathBuf> {
    survey_data_dirs()
        .into_iter()
        .map(|dir| dir.join(name))
        .find(|path| path.is_file())
}

/// Like [`find_test_file`], reporting the searched directories when the
/// file is missing.
pub fn locate_survey_file(name: &str) -> Option<PathBuf> {
    let found = find_test_file(name);
    if found.is_none() {
        eprintln!("SKIPPED: survey file '{}' not found in:", name);
        for dir in survey_data_dirs() {
            eprintln!("  {}", dir.display());
        }
    }
    found
}

/// Temporary directory for test output, removed on drop.
pub fn temp_test_dir() -> tempfile::TempDir {
    tempfile::Builder::new()
        .prefix("survey-test-")
        .tempdir()
        .expect("Failed to create temporary test directory")
}
