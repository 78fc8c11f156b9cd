//! Test harness for folding integration tests.
//!
//! Copies a fixture project into a temp dir and loads its `.indentfold.toml`,
//! so tests can fold real files without touching the source tree.

use indentfold_core::load_indentfold_config;
use indentfold_core::types::FoldConfig;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct FixtureProject {
    pub config: FoldConfig,
    _temp_dir: TempDir,
}

impl FixtureProject {
    /// Create a project from a named fixture directory.
    pub fn from_fixture(name: &str) -> Self {
        let fixture_src = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name);
        assert!(fixture_src.exists(), "Fixture '{name}' not found at {}", fixture_src.display());

        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        copy_dir_recursive(&fixture_src, temp_dir.path());

        let config = load_indentfold_config(temp_dir.path());
        FixtureProject { config, _temp_dir: temp_dir }
    }

    pub fn root(&self) -> &Path {
        &self.config.root
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root().join(rel)
    }

    pub fn read(&self, rel: &str) -> String {
        std::fs::read_to_string(self.path(rel)).expect("Failed to read fixture file")
    }
}

/// Recursively copy a directory tree. Preserves file contents but not metadata.
pub fn copy_dir_recursive(src: &Path, dst: &Path) {
    if !dst.exists() {
        std::fs::create_dir_all(dst).expect("Failed to create dir");
    }
    for entry in std::fs::read_dir(src).expect("Failed to read dir") {
        let entry = entry.expect("Failed to read entry");
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());
        if src_path.is_dir() {
            copy_dir_recursive(&src_path, &dst_path);
        } else {
            std::fs::copy(&src_path, &dst_path).expect("Failed to copy file");
        }
    }
}
