//! Shared test utilities for integration tests

#![allow(dead_code)]

use pbipgen::{compile_dir, CompileError, CompileOptions, CompileSummary};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Directory of a fixture project under tests/test_data
pub fn fixture_dir(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/test_data").join(name)
}

/// Compile options for a fixture project writing into `out`
pub fn fixture_options(name: &str, out: &Path) -> CompileOptions {
    let dir = fixture_dir(name);
    CompileOptions::new(dir.join("model.yaml"), dir.join("sources.yaml"), out)
}

/// Compile a fixture project into a fresh temporary directory
pub fn compile_fixture(name: &str) -> (TempDir, CompileSummary) {
    let out = tempfile::tempdir().expect("create temp dir");
    let summary = compile_dir(&fixture_dir(name), out.path())
        .unwrap_or_else(|e| panic!("Failed to compile fixture {}: {}", name, e));
    (out, summary)
}

/// Copy a fixture project so a test can edit it
pub fn copy_fixture(name: &str) -> TempDir {
    let src = fixture_dir(name);
    let dst = tempfile::tempdir().expect("create temp dir");
    copy_dir(&src, dst.path());
    dst
}

fn copy_dir(src: &Path, dst: &Path) {
    fs::create_dir_all(dst).expect("create dir");
    for entry in fs::read_dir(src).expect("read fixture dir") {
        let entry = entry.expect("dir entry");
        let target = dst.join(entry.file_name());
        if entry.path().is_dir() {
            copy_dir(&entry.path(), &target);
        } else {
            fs::copy(entry.path(), &target).expect("copy fixture file");
        }
    }
}

/// Compile a project directory holding model.yaml and sources.yaml
pub fn compile_copy(dir: &Path) -> Result<(TempDir, CompileSummary), CompileError> {
    let out = tempfile::tempdir().expect("create temp dir");
    compile_dir(dir, out.path()).map(|summary| (out, summary))
}

/// Replace text in a copied fixture file
pub fn edit_file(path: &Path, from: &str, to: &str) {
    let text = fs::read_to_string(path).expect("read file");
    assert!(text.contains(from), "'{}' not found in {}", from, path.display());
    fs::write(path, text.replacen(from, to, 1)).expect("write file");
}

/// Read a TMDL table file from a compiled project
pub fn read_table(summary: &CompileSummary, table: &str) -> String {
    let path = summary
        .semantic_model_dir
        .join("definition/tables")
        .join(format!("{}.tmdl", table));
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e))
}

/// Read a file relative to the semantic model's definition directory
pub fn read_definition(summary: &CompileSummary, file: &str) -> String {
    let path = summary.semantic_model_dir.join("definition").join(file);
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e))
}

/// Assert that `needles` occur in `haystack` in the given order
pub fn assert_in_order(haystack: &str, needles: &[&str]) {
    let mut from = 0;
    for needle in needles {
        match haystack[from..].find(needle) {
            Some(pos) => from += pos + needle.len(),
            None => panic!("'{}' missing or out of order in:\n{}", needle, haystack),
        }
    }
}
