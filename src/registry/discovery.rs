//! Snippet and template directory discovery
//!
//! Directories are returned lowest precedence first:
//!
//! 1. the per-OS global data directory (`<data dir>/pbipgen/transforms`)
//! 2. paths listed in `PBIPGEN_TRANSFORMS_PATH`
//! 3. directories passed explicitly by the caller
//! 4. `<cwd>/transforms` (repository convention)
//! 5. `<model dir>/transforms` (project convention)
//!
//! Directories that do not exist are dropped.

use std::env;
use std::path::{Path, PathBuf};

/// Environment variable holding extra transform directories
pub const TRANSFORMS_PATH_ENV: &str = "PBIPGEN_TRANSFORMS_PATH";

const APP_DIR: &str = "pbipgen";

/// Raw inputs to transform directory resolution
#[derive(Debug, Clone, Default)]
pub struct TransformSearch {
    pub global: Option<PathBuf>,
    pub env_paths: Vec<PathBuf>,
    pub explicit: Vec<PathBuf>,
    pub repo_root: Option<PathBuf>,
    pub project_root: PathBuf,
}

impl TransformSearch {
    /// Collect inputs from the process environment
    pub fn from_env(project_root: &Path, explicit: &[PathBuf]) -> Self {
        TransformSearch {
            global: global_transforms_dir(),
            env_paths: env_transform_dirs(),
            explicit: explicit.iter().map(|p| expand_home(p)).collect(),
            repo_root: env::current_dir().ok(),
            project_root: project_root.to_path_buf(),
        }
    }

    /// Ordered list of existing directories, later overriding earlier
    pub fn resolve(&self) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = Vec::new();
        dirs.extend(self.global.clone());
        dirs.extend(self.env_paths.iter().cloned());
        dirs.extend(self.explicit.iter().cloned());

        let local = self.project_root.join("transforms");
        if let Some(repo_root) = &self.repo_root {
            let repo = repo_root.join("transforms");
            if !same_path(&repo, &local) {
                dirs.push(repo);
            }
        }
        dirs.push(local);

        dirs.into_iter().filter(|d| d.is_dir()).collect()
    }
}

/// `<OS data dir>/pbipgen/transforms`
pub fn global_transforms_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join(APP_DIR).join("transforms"))
}

/// Directories listed in `PBIPGEN_TRANSFORMS_PATH`
pub fn env_transform_dirs() -> Vec<PathBuf> {
    match env::var_os(TRANSFORMS_PATH_ENV) {
        Some(raw) => env::split_paths(&raw)
            .filter(|p| !p.as_os_str().is_empty())
            .map(|p| expand_home(&p))
            .collect(),
        None => Vec::new(),
    }
}

/// Transform directories for a model in `project_root`
pub fn resolve_transform_dirs(project_root: &Path, explicit: &[PathBuf]) -> Vec<PathBuf> {
    TransformSearch::from_env(project_root, explicit).resolve()
}

/// DAX template directories: explicit ones, then `<model dir>/dax`
pub fn resolve_dax_dirs(project_root: &Path, explicit: &[PathBuf]) -> Vec<PathBuf> {
    explicit
        .iter()
        .map(|p| expand_home(p))
        .chain(std::iter::once(project_root.join("dax")))
        .filter(|d| d.is_dir())
        .collect()
}

fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}

fn same_path(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
