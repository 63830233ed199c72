//! Transform and template registry (verb module)
//!
//! Loads named snippets from a precedence-ordered list of directories.
//! Later directories override earlier ones: directories are visited in
//! reverse order and the first file to claim a canonical name wins.

pub mod discovery;
mod dax;
mod error;
mod transforms;

pub use dax::{load_dax_templates, DaxTemplates};
pub use error::RegistryError;
pub use transforms::{load_transforms, Snippet, SnippetKind, TransformRegistry};

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Derive a snippet's canonical name from its file name.
///
/// The extension is dropped, characters outside `[A-Za-z0-9_]` become `_`,
/// and a leading digit gets a `_` prefix.
pub fn canonical_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut safe: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if safe.is_empty() || safe.starts_with(|c: char| c.is_ascii_digit()) {
        safe.insert(0, '_');
    }
    safe
}

/// Read a snippet file, dropping a byte-order mark and surrounding whitespace
fn read_snippet_text(path: &Path) -> Result<String, RegistryError> {
    let text = std::fs::read_to_string(path).map_err(|e| RegistryError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(text.trim_start_matches('\u{feff}').trim().to_string())
}

/// Recursively list files with one of `extensions`, sorted by file name
fn collect_files(dir: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>, RegistryError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| RegistryError::Walk {
            path: dir.display().to_string(),
            message: e.to_string(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let matches = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| extensions.iter().any(|x| x.eq_ignore_ascii_case(ext)));
        if matches {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Shared precedence fold.
///
/// Every file is passed through `load` (so invalid files fail even when they
/// would be shadowed), then recorded unless a higher-precedence directory
/// already claimed its canonical name.
fn load_with_precedence<T, F>(
    dirs: &[PathBuf],
    extensions: &[&str],
    what: &str,
    mut load: F,
) -> Result<BTreeMap<String, T>, RegistryError>
where
    F: FnMut(String, &Path, String) -> Result<T, RegistryError>,
{
    let mut merged: BTreeMap<String, T> = BTreeMap::new();
    let mut origin: BTreeMap<String, PathBuf> = BTreeMap::new();

    for dir in dirs.iter().rev() {
        if !dir.is_dir() {
            debug!(dir = %dir.display(), "Skipping missing {} directory", what);
            continue;
        }
        for path in collect_files(dir, extensions)? {
            let name = canonical_name(&path);
            let text = read_snippet_text(&path)?;
            let item = load(name.clone(), &path, text)?;

            if let Some(winner) = origin.get(&name) {
                debug!(
                    "{} '{}' from {} overridden by {}",
                    what,
                    name,
                    path.display(),
                    winner.display()
                );
                continue;
            }
            debug!("Loaded {} '{}' from {}", what, name, path.display());
            merged.insert(name.clone(), item);
            origin.insert(name, path);
        }
    }

    Ok(merged)
}
