//! Integration tests for the processor module
//!
//! Tests complete batch runs over temporary directories of NSIPRO files.


use std::path::{Path, PathBuf};

pub(crate) const VORTEX_SCAN: &str = include_str!("../../../tests/fixtures/vortex_scan.nsipro");
pub(crate) const LEGACY_HELICAL: &str =
    include_str!("../../../tests/fixtures/legacy_helical.nsipro");

/// Write `contents` to `dir/name`, creating parents
pub(crate) fn write_document(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, contents).unwrap();
    path
}
